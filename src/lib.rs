//! Contact-tracing REST API: users, proximity contacts between users, and
//! the trailing 14-day exposure query.
pub mod app_state;
pub mod config;
pub mod contact_window;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
