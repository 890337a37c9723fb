//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDERDESK_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ORDERDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDERDESK_PORT` - Listen port (default: 8080)
//! - `ORDERDESK_LIST_LIMIT` - Row cap for list endpoints (default: 100, max 1000)
//! - `ORDERDESK_UNKNOWN_PRODUCT` - `reject` (default) or `zero`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use crate::db::UnknownProductPolicy;

const MAX_LIST_LIMIT: i64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Maximum rows returned by list endpoints
    pub list_limit: i64,
    /// Treatment of order lines for products missing from the catalog
    pub unknown_products: UnknownProductPolicy,
    /// Sentry error tracking
    pub sentry: SentryConfig,
}

/// Sentry settings. Reporting is off when `dsn` is `None`.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .optional("ORDERDESK_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("ORDERDESK_DATABASE_URL".to_owned()))?;
        let host = env.parse_or("ORDERDESK_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("ORDERDESK_PORT", 8080_u16)?;

        let list_limit = env.parse_or("ORDERDESK_LIST_LIMIT", 100_i64)?;
        if !(1..=MAX_LIST_LIMIT).contains(&list_limit) {
            return Err(ConfigError::InvalidEnvVar(
                "ORDERDESK_LIST_LIMIT".to_owned(),
                format!("must be between 1 and {MAX_LIST_LIMIT} (got {list_limit})"),
            ));
        }

        let unknown_products =
            env.parse_or("ORDERDESK_UNKNOWN_PRODUCT", UnknownProductPolicy::Reject)?;

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.rate_or("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: env.rate_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            list_limit,
            unknown_products,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, or use `default` when it is unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
            None => Ok(default),
        }
    }

    /// Parse a sampling rate in `0.0..=1.0`.
    fn rate_or(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate = self.parse_or(key, default)?;
        if (0.0..=1.0).contains(&rate) {
            Ok(rate)
        } else {
            Err(ConfigError::InvalidEnvVar(
                key.to_owned(),
                format!("must be between 0.0 and 1.0 (got {rate})"),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    const DB: (&str, &str) = ("ORDERDESK_DATABASE_URL", "postgres://app:hunter2@db/orderdesk");

    #[test]
    fn test_defaults() {
        let config = load(&[DB]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.list_limit, 100);
        assert_eq!(config.unknown_products, UnknownProductPolicy::Reject);
        assert!(config.sentry.dsn.is_none());
        assert!((config.sentry.sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ORDERDESK_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            DB,
            ("ORDERDESK_HOST", "0.0.0.0"),
            ("ORDERDESK_PORT", "9090"),
            ("ORDERDESK_LIST_LIMIT", "25"),
            ("ORDERDESK_UNKNOWN_PRODUCT", "zero"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
            ("SENTRY_TRACES_SAMPLE_RATE", "0.25"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9090");
        assert_eq!(config.list_limit, 25);
        assert_eq!(config.unknown_products, UnknownProductPolicy::ZeroPrice);
        assert!(config.sentry.dsn.is_some());
        assert!((config.sentry.traces_sample_rate - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("ORDERDESK_PORT", "eighty"),
            ("ORDERDESK_LIST_LIMIT", "0"),
            ("ORDERDESK_LIST_LIMIT", "5000"),
            ("ORDERDESK_UNKNOWN_PRODUCT", "ignore"),
            ("SENTRY_SAMPLE_RATE", "1.5"),
        ] {
            let err = load(&[DB, (key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == key),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[DB]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
