//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Runtime configuration
    pub rust_log: String,

    /// Endpoint list consumed by the worker; stdin when unset
    pub endpoints_file: Option<PathBuf>,

    /// Worker back-off after the queue reports it is temporarily empty
    pub worker_poll_interval: Duration,
    pub worker_max_backoff: Duration,

    /// How the resolver treats endpoints already claimed by several repositories,
    /// as given (`canonical` or `reject`, case-insensitive)
    pub resolver_multiple_match: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Configuration("DATABASE_URL is required".to_string()))?;

        let worker_poll_interval = Duration::from_millis(parse_millis(
            &lookup,
            "WORKER_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL_MS,
        )?);
        let worker_max_backoff = Duration::from_millis(parse_millis(
            &lookup,
            "WORKER_MAX_BACKOFF_MS",
            DEFAULT_MAX_BACKOFF_MS,
        )?);

        if worker_max_backoff < worker_poll_interval {
            return Err(Error::Configuration(
                "WORKER_MAX_BACKOFF_MS must not be lower than WORKER_POLL_INTERVAL_MS".to_string(),
            ));
        }

        // Parsed and validated where the resolver is built
        let resolver_multiple_match =
            lookup("RESOLVER_MULTIPLE_MATCH").unwrap_or_else(|| "canonical".to_string());

        Ok(Self {
            database_url,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "archivist=info".to_string()),
            endpoints_file: lookup("ENDPOINTS_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            worker_poll_interval,
            worker_max_backoff,
            resolver_multiple_match,
        })
    }
}

fn parse_millis<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => {
            let value = raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!("{key} must be a number of milliseconds, got {raw:?}"))
            })?;
            if value == 0 {
                return Err(Error::Configuration(format!("{key} must be positive")));
            }
            Ok(value)
        }
    }
}
