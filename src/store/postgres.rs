use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use super::{decode_contacts, schema_statements, ContactFilter, ContactRow, ContactStore, StoreError, UserRow};
use crate::models::{Contact, InsertResult, User};

const POSTGRES_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/res/sql/postgres/schema.sql"
));

const INSERT_USER: &str = "INSERT INTO users (id, name, date_of_birth, phone_number, email_address, creation_ts_ms) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING doc_id";

const FIND_USER: &str = "SELECT id, name, date_of_birth, phone_number, email_address, creation_ts_ms \
     FROM users WHERE id = $1 ORDER BY doc_id LIMIT 1";

const INSERT_CONTACT: &str = "INSERT INTO contacts (user_id_one, user_id_two, time_of_contact_ms) \
     VALUES ($1, $2, $3) RETURNING doc_id";

const FIND_CONTACTS: &str = "SELECT user_id_one, user_id_two, time_of_contact_ms FROM contacts \
     WHERE (user_id_one = $1 OR user_id_two = $1) \
     AND time_of_contact_ms BETWEEN $2 AND $3 \
     ORDER BY doc_id";

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    schema: String,
}

impl PostgresStore {
    /// Connects and pins every pooled connection to `schema`.
    pub async fn connect(url: &str, schema: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(set_search_path(schema.to_string()))
            .connect(url)
            .await?;

        info!(schema, max_connections, "postgres pool ready");
        Ok(Self {
            pool,
            schema: schema.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ContactStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for stmt in schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        debug!(schema = %self.schema, "postgres schema applied");
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query(&reset_statement(&self.schema))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<InsertResult, StoreError> {
        let inserted_id = sqlx::query_scalar::<_, i64>(INSERT_USER)
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
        let row = sqlx::query_as::<_, UserRow>(FIND_USER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<InsertResult, StoreError> {
        let inserted_id = sqlx::query_scalar::<_, i64>(INSERT_CONTACT)
            .bind(&contact.user_id_one)
            .bind(&contact.user_id_two)
            .bind(contact.time_of_contact.timestamp_millis())
            .fetch_one(&self.pool)
            .await?;
        Ok(InsertResult { inserted_id })
    }

    async fn find_contacts(&self, filter: &ContactFilter) -> Result<Vec<Contact>, StoreError> {
        let rows = sqlx::query_as::<_, ContactRow>(FIND_CONTACTS)
            .bind(&filter.user_id)
            .bind(filter.window.start.timestamp_millis())
            .bind(filter.window.end.timestamp_millis())
            .fetch_all(&self.pool)
            .await?;
        decode_contacts(rows)
    }
}

fn reset_statement(schema: &str) -> String {
    let schema = quote_ident(schema);
    format!("TRUNCATE TABLE {schema}.\"contacts\", {schema}.\"users\" RESTART IDENTITY")
}

#[allow(clippy::type_complexity)]
fn set_search_path(
    schema: String,
) -> impl Fn(
    &mut sqlx::PgConnection,
    sqlx::pool::PoolConnectionMetadata,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), sqlx::Error>> + Send + '_>> {
    move |conn, _meta| {
        let schema_ident = quote_ident(&schema);
        Box::pin(async move {
            let create_stmt = format!("CREATE SCHEMA IF NOT EXISTS {schema_ident}");
            sqlx::query(&create_stmt).execute(&mut *conn).await?;

            let search_stmt = format!("SET search_path TO {schema_ident}");
            sqlx::query(&search_stmt).execute(&mut *conn).await?;
            Ok(())
        })
    }
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
