use std::path::{
  Path,
  PathBuf
};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]

pub enum ConfigError {
  #[error("config IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("config parse error: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("config invalid: {0}")]
  Invalid(String)
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]

pub enum AppMode {
  Dev,
  Prod
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]

pub enum SqlDialect {
  Sqlite,
  Postgres
}

/// Where the store lives once file
/// settings and environment overrides
/// are merged.
#[derive(Debug, Clone, PartialEq, Eq)]

pub enum DatabaseTarget {
  SqliteFile(PathBuf),
  SqliteUrl(String),
  Postgres {
    url:    String,
    schema: String
  }
}

#[derive(Debug, Deserialize)]

pub struct ServerConfig {
  pub app:      AppConfig,
  pub http:     HttpConfig,
  pub database: DatabaseConfig,
  pub sqlite:   SqliteConfig,
  pub postgres: Option<PostgresConfig>,
  pub logging:  LoggingConfig,
  #[serde(default)]
  pub contacts: ContactsConfig,
  pub dev:      DevConfig,
  #[serde(skip)]
  pub database_url: Option<String>
}

#[derive(Debug, Deserialize)]

pub struct AppConfig {
  pub mode: AppMode
}

#[derive(Debug, Deserialize)]

pub struct HttpConfig {
  pub host: String,
  pub port: u16
}

#[derive(Debug, Deserialize)]

pub struct DatabaseConfig {
  pub dialect:         String,
  #[serde(default = "default_max_connections")]
  pub max_connections: u32
}

#[derive(Debug, Deserialize)]

pub struct SqliteConfig {
  pub path: String
}

#[derive(Debug, Deserialize)]

pub struct PostgresConfig {
  pub host:     String,
  pub port:     u16,
  pub database: String,
  pub user:     String,
  pub password: String,
  pub ssl_mode: String,
  pub schema:   String
}

#[derive(Debug, Deserialize)]

pub struct LoggingConfig {
  pub level: Option<String>
}

#[derive(Debug, Default, Deserialize)]

pub struct ContactsConfig {
  #[serde(default)]
  pub deduplicate: bool
}

#[derive(Debug, Deserialize)]

pub struct DevConfig {
  pub reset_on_start: bool
}

fn default_max_connections() -> u32 {
  10
}

impl ServerConfig {
  /// Reads the file, then applies
  /// `DATABASE_URL` and `PORT` from the
  /// environment.
  pub async fn load(
    path: &Path
  ) -> Result<Self, ConfigError> {
    let mut config =
      Self::load_file(path).await?;

    config.apply_overrides(
      std::env::var("DATABASE_URL").ok(),
      std::env::var("PORT").ok()
    )?;

    Ok(config)
  }

  /// Reads and validates the file
  /// against `schemas/server.schema.json`
  /// in the same directory.
  pub async fn load_file(
    path: &Path
  ) -> Result<Self, ConfigError> {
    let base_dir = path
      .parent()
      .ok_or_else(|| {
        ConfigError::Invalid(
          "config path has no parent"
            .into()
        )
      })?;

    let schema_path = base_dir
      .join("schemas")
      .join("server.schema.json");

    let schema =
      load_schema(&schema_path).await?;

    let content =
      tokio::fs::read_to_string(path)
        .await?;

    Self::from_toml(
      &schema,
      &content,
      &path.display().to_string()
    )
  }

  /// Validates `content` against the
  /// JSON schema, then deserialises.
  pub fn from_toml(
    schema: &str,
    content: &str,
    name: &str
  ) -> Result<Self, ConfigError> {
    validate_toml(
      schema, content, name
    )?;

    let config: ServerConfig =
      toml::from_str(content)?;

    config.dialect()?;

    Ok(config)
  }

  pub fn apply_overrides(
    &mut self,
    database_url: Option<String>,
    port: Option<String>
  ) -> Result<(), ConfigError> {
    if let Some(url) = database_url
      .map(|u| u.trim().to_string())
      .filter(|u| !u.is_empty())
    {
      dialect_from_url(&url)?;
      self.database_url = Some(url);
    }

    if let Some(raw) = port {
      self.http.port =
        raw.trim().parse().map_err(
          |e| {
            ConfigError::Invalid(
              format!(
                "invalid PORT \
                 '{raw}': {e}"
              )
            )
          }
        )?;
    }

    Ok(())
  }

  pub fn dialect(
    &self
  ) -> Result<SqlDialect, ConfigError>
  {
    if let Some(url) =
      &self.database_url
    {
      return dialect_from_url(url);
    }

    match self
      .database
      .dialect
      .trim()
      .to_lowercase()
      .as_str()
    {
      | "sqlite" => {
        Ok(SqlDialect::Sqlite)
      }
      | "postgres" => {
        Ok(SqlDialect::Postgres)
      }
      | other => {
        Err(ConfigError::Invalid(
          format!(
            "invalid database.dialect \
             '{other}'"
          )
        ))
      }
    }
  }

  pub fn sqlite_path(
    &self,
    base_dir: &Path
  ) -> PathBuf {
    let raw = self.sqlite.path.trim();

    if raw.is_empty() {
      return base_dir
        .join("contacts.sqlite");
    }

    base_dir.join(raw)
  }

  pub fn database_target(
    &self,
    base_dir: &Path
  ) -> Result<DatabaseTarget, ConfigError>
  {
    let schema = self
      .postgres
      .as_ref()
      .map(|pg| pg.schema.as_str())
      .unwrap_or("public");

    if let Some(url) =
      &self.database_url
    {
      return Ok(
        match dialect_from_url(url)? {
          | SqlDialect::Sqlite => {
            DatabaseTarget::SqliteUrl(
              url.clone()
            )
          }
          | SqlDialect::Postgres => {
            DatabaseTarget::Postgres {
              url:    url.clone(),
              schema:
                validate_schema_name(
                  schema
                )?
            }
          }
        }
      );
    }

    match self.dialect()? {
      | SqlDialect::Sqlite => {
        Ok(DatabaseTarget::SqliteFile(
          self.sqlite_path(base_dir)
        ))
      }
      | SqlDialect::Postgres => {
        let pg = self
          .postgres
          .as_ref()
          .ok_or_else(|| {
            ConfigError::Invalid(
              "postgres section missing"
                .into()
            )
          })?;

        let url = format!(
          "postgres://{}:{}@{}:{}/{}?\
           sslmode={}",
          pg.user,
          pg.password,
          pg.host,
          pg.port,
          pg.database,
          pg.ssl_mode
        );

        Ok(DatabaseTarget::Postgres {
          url,
          schema: validate_schema_name(
            &pg.schema
          )?
        })
      }
    }
  }
}

fn dialect_from_url(
  url: &str
) -> Result<SqlDialect, ConfigError> {
  if url.starts_with("sqlite:") {
    return Ok(SqlDialect::Sqlite);
  }

  if url.starts_with("postgres://")
    || url.starts_with("postgresql://")
  {
    return Ok(SqlDialect::Postgres);
  }

  Err(ConfigError::Invalid(
    "DATABASE_URL must start with \
     sqlite:, postgres:// or \
     postgresql://"
      .into()
  ))
}

async fn load_schema(
  path: &Path
) -> Result<String, ConfigError> {
  let content =
    tokio::fs::read_to_string(path)
      .await
      .map_err(|_| {
        ConfigError::Invalid(format!(
          "schema not found at {}",
          path.display()
        ))
      })?;

  Ok(content)
}

fn validate_toml(
  schema: &str,
  toml_input: &str,
  name: &str
) -> Result<(), ConfigError> {
  let schema_json: serde_json::Value =
    serde_json::from_str(schema)
      .map_err(|e| {
        ConfigError::Invalid(format!(
          "schema parse error: {e}"
        ))
      })?;

  let compiled =
    jsonschema::validator_for(
      &schema_json
    )
    .map_err(|e| {
      ConfigError::Invalid(format!(
        "schema compile error: {e}"
      ))
    })?;

  let toml_value: toml::Value =
    toml::from_str(toml_input)
      .map_err(|e| {
        ConfigError::Invalid(format!(
          "{name}: {e}"
        ))
      })?;

  let json_value =
    serde_json::to_value(toml_value)
      .map_err(|e| {
        ConfigError::Invalid(
          e.to_string()
        )
      })?;

  let mut errors =
    compiled.iter_errors(&json_value);

  if let Some(err) = errors.next() {
    let mut messages =
      vec![err.to_string()];

    for e in errors.take(4) {
      messages.push(e.to_string());
    }

    return Err(ConfigError::Invalid(
      format!(
        "schema validation failed for \
         {name}: {}",
        messages.join("; ")
      )
    ));
  }

  Ok(())
}

pub(crate) fn validate_schema_name(
  raw: &str
) -> Result<String, ConfigError> {
  let trimmed = raw.trim();

  if trimmed.is_empty() {
    return Err(ConfigError::Invalid(
      "postgres schema cannot be empty"
        .into()
    ));
  }

  if !trimmed.chars().all(|c| {
    c.is_ascii_alphanumeric()
      || c == '_'
  }) {
    return Err(ConfigError::Invalid(
      format!(
        "invalid postgres schema \
         '{trimmed}': only \
         alphanumeric and '_' allowed"
      )
    ));
  }

  Ok(trimmed.to_string())
}
