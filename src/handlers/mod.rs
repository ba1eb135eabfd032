mod contacts;
mod health;
mod users;

use axum::Router;
use axum::routing::{
  get,
  post
};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub fn router(
  state: AppState
) -> Router {
  Router::new()
        .route("/health", get(health::health))
        .route("/users", post(users::create_user))
        .route("/users/:user_id", get(users::get_user))
        .route("/contacts", post(contacts::create_contact).get(contacts::list_contacts))
        .route("/contacts/", get(contacts::list_contacts))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
