//! Configuration management
//!
//! Credentials and endpoints come from the environment (a `.env` file in the working
//! directory is honoured). Feed filters are plain values passed to each pipeline run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::warn;

use crate::error::{EtlError, EtlResult};

/// Key used when `API_KEY` is not set. NREL accepts it with a low rate limit.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Default PostgreSQL port.
pub const DEFAULT_DATABASE_PORT: u16 = 5432;

/// Default HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default root directory for CSV snapshots.
pub const DEFAULT_OUTPUT_DIR: &str = "datasets";

/// Filters for the alternative-fuel station feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationQuery {
    pub access: String,
    pub fuel_type: String,
    pub state: String,
}

impl Default for StationQuery {
    fn default() -> Self {
        Self {
            access: "all".to_string(),
            fuel_type: "all".to_string(),
            state: "all".to_string(),
        }
    }
}

/// Target vehicle for the complaint feed. Rows for other vehicles are filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintQuery {
    pub make: String,
    pub model: String,
    pub model_year: String,
}

impl Default for ComplaintQuery {
    fn default() -> Self {
        Self {
            make: "JEEP".to_string(),
            model: "WRANGLER".to_string(),
            model_year: "2021".to_string(),
        }
    }
}

/// Connection settings for the summary-table database.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub port: u16,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("port", &self.port)
            .finish()
    }
}

/// Process-level configuration, loaded once at start-up.
///
/// Serializes without secrets, for logging the effective configuration.
#[derive(Debug, Clone, Serialize)]
pub struct EtlConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    /// `None` when `SERVER_NAME`/`DB_NAME` are unset; loading is then skipped.
    pub database: Option<DatabaseConfig>,
    #[serde(rename = "http_timeout_secs", serialize_with = "as_secs")]
    pub http_timeout: Duration,
    pub output_dir: PathBuf,
}

fn as_secs<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(timeout.as_secs())
}

impl EtlConfig {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> EtlResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> EtlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = match get("API_KEY") {
            Some(key) => key,
            None => {
                warn!("API_KEY not set, falling back to {DEMO_API_KEY}");
                DEMO_API_KEY.to_string()
            }
        };

        let database = match (get("SERVER_NAME"), get("DB_NAME")) {
            (Some(host), Some(database)) => Some(DatabaseConfig {
                host,
                database,
                username: get("USERNAME").unwrap_or_default(),
                password: get("PASSWORD").unwrap_or_default(),
                port: match get("PORT") {
                    Some(p) => p.trim().parse().map_err(|_| {
                        EtlError::configuration(format!("PORT must be a port number, got '{p}'"))
                    })?,
                    None => DEFAULT_DATABASE_PORT,
                },
            }),
            _ => None,
        };

        let http_timeout = match get("ETL_HTTP_TIMEOUT_SECS") {
            Some(s) => Duration::from_secs(s.trim().parse().map_err(|_| {
                EtlError::configuration(format!("ETL_HTTP_TIMEOUT_SECS must be an integer, got '{s}'"))
            })?),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let config = Self {
            api_key,
            database,
            http_timeout,
            output_dir: get("ETL_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        };
        config.validate()?;
        Ok(config)
    }

    /// The configuration as one line of JSON, without the API key or database password.
    pub fn to_log_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable config: {e}>"))
    }

    /// Validate configuration
    pub fn validate(&self) -> EtlResult<()> {
        if self.http_timeout.is_zero() {
            return Err(EtlError::configuration("http timeout must be greater than 0"));
        }
        if let Some(db) = &self.database {
            if db.port == 0 {
                return Err(EtlError::configuration("database port must be greater than 0"));
            }
            if db.username.is_empty() {
                return Err(EtlError::configuration(
                    "USERNAME must be set when SERVER_NAME and DB_NAME are",
                ));
            }
        }
        Ok(())
    }
}
