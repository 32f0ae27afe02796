//! Process configuration from the environment.
//!
//! Environment variables (`run` loads a `.env` file first):
//! - OPDECK_DB_PATH: SQLite file (default: local data dir/opdeck/opdeck.db)
//! - OPDECK_ANILIST_URL: list service GraphQL endpoint
//! - OPDECK_ANIMETHEMES_URL: theme index base URL
//! - OPDECK_MAX_ATTEMPTS: request attempts before giving up
//! - OPDECK_JITTER_MS: upper bound of random retry jitter
//! - OPDECK_TIMEOUT_SECS: per-request timeout

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::anilist;
use crate::client::RetryPolicy;
use crate::themes;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("No local data directory; set OPDECK_DB_PATH")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub anilist_url: String,
    pub animethemes_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("OPDECK_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => dirs::data_local_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("opdeck")
                .join("opdeck.db"),
        };

        let mut retry = RetryPolicy::default();
        if let Some(attempts) = parsed::<u32, _>(&lookup, "OPDECK_MAX_ATTEMPTS")? {
            if attempts == 0 {
                return Err(ConfigError::Invalid {
                    name: "OPDECK_MAX_ATTEMPTS",
                    value: attempts.to_string(),
                });
            }
            retry.max_attempts = attempts;
        }
        if let Some(ms) = parsed::<u64, _>(&lookup, "OPDECK_JITTER_MS")? {
            retry.jitter = Duration::from_millis(ms);
        }
        let timeout = parsed::<u64, _>(&lookup, "OPDECK_TIMEOUT_SECS")?
            .map_or(Duration::from_secs(30), Duration::from_secs);

        Ok(Self {
            db_path,
            anilist_url: lookup("OPDECK_ANILIST_URL")
                .unwrap_or_else(|| anilist::DEFAULT_ENDPOINT.to_string()),
            animethemes_url: lookup("OPDECK_ANIMETHEMES_URL")
                .unwrap_or_else(|| themes::DEFAULT_BASE_URL.to_string()),
            user_agent: format!("opdeck/{}", env!("CARGO_PKG_VERSION")),
            timeout,
            retry,
        })
    }
}

fn parsed<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
