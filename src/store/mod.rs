//! Users and Contacts collections behind a backend-neutral trait.
mod postgres;
mod sqlite;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contact_window::ContactWindow;
use crate::models::{Contact, InsertResult, User};

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Edges touching `user_id` whose contact time falls inside `window`.
#[derive(Debug, Clone)]
pub struct ContactFilter {
    pub user_id: String,
    pub window: ContactWindow,
}

#[async_trait::async_trait]
pub trait ContactStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn migrate(&self) -> Result<(), StoreError>;
    async fn reset(&self) -> Result<(), StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_user(&self, user: &User) -> Result<InsertResult, StoreError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn insert_contact(&self, contact: &Contact) -> Result<InsertResult, StoreError>;
    async fn find_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, StoreError>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    date_of_birth: String,
    phone_number: String,
    email_address: String,
    creation_ts_ms: i64,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            creation_timestamp: from_millis(row.creation_ts_ms)?,
            id: row.id,
            name: row.name,
            date_of_birth: row.date_of_birth,
            phone_number: row.phone_number,
            email_address: row.email_address,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    user_id_one: String,
    user_id_two: String,
    time_of_contact_ms: i64,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StoreError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            time_of_contact: from_millis(row.time_of_contact_ms)?,
            user_id_one: row.user_id_one,
            user_id_two: row.user_id_two,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}

fn decode_contacts(rows: Vec<ContactRow>) -> Result<Vec<Contact>, StoreError> {
    rows.into_iter().map(Contact::try_from).collect()
}

/// Splits an embedded schema file into executable statements.
fn schema_statements(content: &str) -> impl Iterator<Item = &str> {
    content
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
}
