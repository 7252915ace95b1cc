//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Base URL of the remote analysis service, without a trailing slash.
    pub analyzer_base_url: String,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Remote Analysis Service ---
        let analyzer_base_url = lookup("ANALYZER_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8000".to_string());
        if !(analyzer_base_url.starts_with("http://") || analyzer_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue(
                "ANALYZER_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", analyzer_base_url),
            ));
        }
        let analyzer_base_url = analyzer_base_url.trim_end_matches('/').to_string();

        let request_timeout = Duration::from_secs(positive_number(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            120,
        )?);
        let max_upload_bytes =
            positive_number(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)? as usize;

        Ok(Self {
            bind_address,
            analyzer_base_url,
            log_level,
            request_timeout,
            max_upload_bytes,
            cors_allowed_origin,
        })
    }
}

fn positive_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}
