use std::path::Path;
use std::sync::Arc;

use crate::config::{
  AppMode,
  ConfigError,
  DatabaseTarget,
  ServerConfig
};
use crate::store::{
  ContactStore,
  PostgresStore,
  SqliteStore
};

/// Opens the configured backend, applies
/// its schema and, in dev mode, wipes it
/// when asked to.
pub async fn connect_store(
  config: &ServerConfig,
  config_path: &Path
) -> Result<Arc<dyn ContactStore>, ConfigError>
{
  let base_dir = config_path
    .parent()
    .ok_or_else(|| {
      ConfigError::Invalid(
        "config path has no parent"
          .into()
      )
    })?;

  let max_connections =
    config.database.max_connections;

  let store: Arc<dyn ContactStore> =
    match config
      .database_target(base_dir)?
    {
      | DatabaseTarget::SqliteFile(
        path
      ) => Arc::new(
        SqliteStore::open(
          &path,
          max_connections
        )
        .await
        .map_err(|e| {
          ConfigError::Invalid(format!(
            "sqlite connect failed: {e}"
          ))
        })?
      ),
      | DatabaseTarget::SqliteUrl(url) => {
        Arc::new(
          SqliteStore::connect(
            &url,
            max_connections
          )
          .await
          .map_err(|e| {
            ConfigError::Invalid(
              format!(
                "sqlite connect \
                 failed: {e}"
              )
            )
          })?
        )
      }
      | DatabaseTarget::Postgres {
        url,
        schema
      } => Arc::new(
        PostgresStore::connect(
          &url,
          &schema,
          max_connections
        )
        .await
        .map_err(|e| {
          ConfigError::Invalid(format!(
            "postgres connect failed: \
             {e}"
          ))
        })?
      )
    };

  store.migrate().await.map_err(|e| {
    ConfigError::Invalid(format!(
      "schema apply error: {e}"
    ))
  })?;

  if config.app.mode == AppMode::Dev
    && config.dev.reset_on_start
  {
    tracing::warn!(
      backend = store.backend(),
      "dev mode reset, clearing users \
       and contacts"
    );

    store.reset().await.map_err(|e| {
      ConfigError::Invalid(format!(
        "cleanup failed: {e}"
      ))
    })?;
  }

  Ok(store)
}
