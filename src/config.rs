//! Configuration from the environment.
//!
//! A `.env` file in the working directory is loaded first (if present), then
//! real environment variables override it:
//!
//! - `AB_DB_HOST` (default `localhost`), `AB_DB_PORT` (default `5432`)
//! - `AB_DB_USER`, `AB_DB_PASSWORD`, `AB_DB_NAME`
//! - `AB_MINUTES_FIELD` (default `minutes_watched`)
//! - `AB_DURATION_FIELD` (default `content_duration`)

use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_MINUTES_FIELD: &str = "minutes_watched";
const DEFAULT_DURATION_FIELD: &str = "content_duration";

/// Name of the column the completion labeller writes.
pub const VIEWING_STATUS_FIELD: &str = "viewing_status";

/// PostgreSQL connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub dbname: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: None,
            password: None,
            dbname: None,
        }
    }
}

impl DbConfig {
    /// Whether enough is configured to attempt a connection.
    pub fn is_complete(&self) -> bool {
        self.user.is_some() && self.dbname.is_some()
    }
}

/// Names of the viewing-record columns used by the completion labeller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub minutes_watched: String,
    pub content_duration: String,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            minutes_watched: DEFAULT_MINUTES_FIELD.to_string(),
            content_duration: DEFAULT_DURATION_FIELD.to_string(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DbConfig,
    #[serde(default)]
    pub fields: FieldConfig,
}

impl AppConfig {
    /// Load `.env` (ignored if missing), then read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(host) = lookup("AB_DB_HOST") {
            config.database.host = host;
        }
        if let Some(port) = lookup("AB_DB_PORT") {
            config.database.port = port
                .trim()
                .parse()
                .with_context(|| format!("AB_DB_PORT is not a valid port: '{port}'"))?;
        }
        config.database.user = lookup("AB_DB_USER");
        config.database.password = lookup("AB_DB_PASSWORD");
        config.database.dbname = lookup("AB_DB_NAME");

        if let Some(field) = lookup("AB_MINUTES_FIELD") {
            config.fields.minutes_watched = field;
        }
        if let Some(field) = lookup("AB_DURATION_FIELD") {
            config.fields.content_duration = field;
        }

        Ok(config)
    }
}
