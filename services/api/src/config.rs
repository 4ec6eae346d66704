//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use smartstock_core::CountrySet;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Base URL of the SmartStock backend, without a trailing slash.
    pub backend_url: String,
    pub log_level: Level,
    pub allowed_origin: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub training_poll_interval: Duration,
    /// Wizards untouched for this long are dropped.
    pub wizard_idle_timeout: Duration,
    pub countries: CountrySet,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Backend Settings ---
        let backend_url = std::env::var("BACKEND_URL")
            .map_err(|_| ConfigError::MissingVar("BACKEND_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "BACKEND_URL".to_string(),
                format!("'{}' is not an http(s) URL", backend_url),
            ));
        }

        let request_timeout = Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", 30)?);
        let max_upload_bytes = parse_number("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)? as usize;
        let training_poll_interval =
            Duration::from_millis(parse_number("TRAINING_POLL_INTERVAL_MS", 2000)?);
        if training_poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "TRAINING_POLL_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let wizard_idle_timeout = Duration::from_secs(parse_number("WIZARD_IDLE_SECS", 3600)?);

        // --- Metadata Settings ---
        let mut countries = CountrySet::default();
        if let Ok(extra) = std::env::var("EXTRA_COUNTRIES") {
            countries.extend(extra.split(','));
        }

        Ok(Self {
            bind_address,
            backend_url,
            log_level,
            allowed_origin,
            request_timeout,
            max_upload_bytes,
            training_poll_interval,
            wizard_idle_timeout,
            countries,
        })
    }
}

fn parse_number(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn numbers_fall_back_to_default_when_unset() {
        assert_eq!(parse_number("SMARTSTOCK_TEST_UNSET_NUMBER", 42).unwrap(), 42);
    }

    #[test]
    fn numbers_are_trimmed_and_validated() {
        std::env::set_var("SMARTSTOCK_TEST_PADDED_NUMBER", " 15 ");
        assert_eq!(parse_number("SMARTSTOCK_TEST_PADDED_NUMBER", 0).unwrap(), 15);

        std::env::set_var("SMARTSTOCK_TEST_BAD_NUMBER", "ten");
        assert_matches!(
            parse_number("SMARTSTOCK_TEST_BAD_NUMBER", 0),
            Err(ConfigError::InvalidValue(var, _)) if var == "SMARTSTOCK_TEST_BAD_NUMBER"
        );
    }
}
