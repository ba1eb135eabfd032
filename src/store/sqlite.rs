use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{debug, info};

use super::{decode_contacts, schema_statements, ContactFilter, ContactRow, ContactStore, StoreError, UserRow};
use crate::models::{Contact, InsertResult, User};

const SQLITE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/res/sql/sqlite/schema.sql"
));

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(path: &Path, max_connections: u32) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::connect(&format!("sqlite://{}", path.display()), max_connections).await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        info!(url, max_connections, "sqlite pool ready");
        Ok(Self { pool })
    }

    /// Private in-memory database. One pinned connection keeps the data alive.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl ContactStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for stmt in schema_statements(SQLITE_SCHEMA) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        debug!("sqlite schema applied");
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        for table in ["contacts", "users"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<InsertResult, StoreError> {
        let inserted_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (id, name, date_of_birth, phone_number, email_address, creation_ts_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING doc_id",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.date_of_birth)
        .bind(&user.phone_number)
        .bind(&user.email_address)
        .bind(user.creation_timestamp.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(InsertResult { inserted_id })
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, date_of_birth, phone_number, email_address, creation_ts_ms \
             FROM users WHERE id = ?1 ORDER BY doc_id LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<InsertResult, StoreError> {
        let inserted_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO contacts (user_id_one, user_id_two, time_of_contact_ms) \
             VALUES (?1, ?2, ?3) RETURNING doc_id",
        )
        .bind(&contact.user_id_one)
        .bind(&contact.user_id_two)
        .bind(contact.time_of_contact.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;
        Ok(InsertResult { inserted_id })
    }

    async fn find_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, StoreError> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT user_id_one, user_id_two, time_of_contact_ms FROM contacts \
             WHERE (user_id_one = ?1 OR user_id_two = ?1) \
             AND time_of_contact_ms >= ?2 AND time_of_contact_ms <= ?3 \
             ORDER BY doc_id",
        )
        .bind(&filter.user_id)
        .bind(filter.window.start.timestamp_millis())
        .bind(filter.window.end.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;
        decode_contacts(rows)
    }
}
