//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local `PostgreSQL` install.
//!
//! ## Database
//! - `DATABASE_URL` - Full connection string; overrides the `DB_*` parts below
//! - `DB_HOST` - Database host (default: localhost)
//! - `DB_PORT` - Database port (default: 5432)
//! - `DB_NAME` - Database name (default: sustainability)
//! - `DB_USER` - Database user (default: postgres)
//! - `DB_PASSWORD` - Database password (default: postgres)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 20)
//! - `DB_ACQUIRE_TIMEOUT_MS` - Max wait for a pooled connection (default: 2000)
//! - `DB_IDLE_TIMEOUT_MS` - Idle connection lifetime (default: 30000)
//! - `DB_CONNECT_MAX_RETRIES` - Startup probe attempts (default: 30)
//! - `DB_CONNECT_RETRY_DELAY_MS` - Delay between startup probes (default: 2000)
//!
//! ## Server
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3001)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//!
//! ## Error tracking
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Environment tag for Sentry events
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected \"text\" or \"json\", got \"{other}\"")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Database connection and pool settings
    pub database: DatabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of requests traced in Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Database connection and pool configuration.
///
/// Implements `Debug` manually to redact credentials.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection URL, preferred over the discrete fields when set
    pub url: Option<SecretString>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long a request waits for a pooled connection
    pub acquire_timeout: Duration,
    /// How long an unused connection stays open
    pub idle_timeout: Duration,
    /// Startup probe attempts before giving up
    pub connect_max_retries: u32,
    /// Delay between startup probe attempts
    pub connect_retry_delay: Duration,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("connect_max_retries", &self.connect_max_retries)
            .field("connect_retry_delay", &self.connect_retry_delay)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database = DatabaseConfig::from_lookup(&lookup)?;

        Ok(Self {
            database,
            host: parse_or_default(&lookup, "HOST", "0.0.0.0")?,
            port: parse_or_default(&lookup, "PORT", "3001")?,
            log_format: parse_or_default(&lookup, "LOG_FORMAT", "text")?,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(&lookup, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_or_default(
                &lookup,
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: lookup("DATABASE_URL")
                .filter(|url| !url.is_empty())
                .map(SecretString::from),
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".to_owned()),
            port: parse_or_default(lookup, "DB_PORT", "5432")?,
            name: lookup("DB_NAME").unwrap_or_else(|| "sustainability".to_owned()),
            user: lookup("DB_USER").unwrap_or_else(|| "postgres".to_owned()),
            password: SecretString::from(
                lookup("DB_PASSWORD").unwrap_or_else(|| "postgres".to_owned()),
            ),
            max_connections: parse_or_default(lookup, "DB_MAX_CONNECTIONS", "20")?,
            acquire_timeout: millis_or_default(lookup, "DB_ACQUIRE_TIMEOUT_MS", "2000")?,
            idle_timeout: millis_or_default(lookup, "DB_IDLE_TIMEOUT_MS", "30000")?,
            connect_max_retries: parse_or_default(lookup, "DB_CONNECT_MAX_RETRIES", "30")?,
            connect_retry_delay: millis_or_default(lookup, "DB_CONNECT_RETRY_DELAY_MS", "2000")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_owned());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Parse a millisecond count into a `Duration`.
fn millis_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    parse_or_default::<u64>(lookup, key, default).map(Duration::from_millis)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.sentry_dsn.is_none());

        let db = &config.database;
        assert!(db.url.is_none());
        assert_eq!(db.host, "localhost");
        assert_eq!(db.port, 5432);
        assert_eq!(db.name, "sustainability");
        assert_eq!(db.user, "postgres");
        assert_eq!(db.password.expose_secret(), "postgres");
        assert_eq!(db.max_connections, 20);
        assert_eq!(db.acquire_timeout, Duration::from_secs(2));
        assert_eq!(db.idle_timeout, Duration::from_secs(30));
        assert_eq!(db.connect_max_retries, 30);
        assert_eq!(db.connect_retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("LOG_FORMAT", "JSON"),
            ("DB_HOST", "db"),
            ("DB_CONNECT_MAX_RETRIES", "3"),
            ("DATABASE_URL", "postgres://u:p@db/eco"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.connect_max_retries, 3);
        assert_eq!(
            config.database.url.as_ref().map(ExposeSecret::expose_secret),
            Some("postgres://u:p@db/eco")
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = config_from(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PORT"));
    }

    #[test]
    fn test_invalid_log_format() {
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_empty_database_url_is_ignored() {
        let config = config_from(&[("DATABASE_URL", "")]).unwrap();
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_database_config_debug_redacts_secrets() {
        let config = config_from(&[
            ("DB_PASSWORD", "super_secret_password"),
            ("DATABASE_URL", "postgres://user:hunter2@db/eco"),
        ])
        .unwrap();

        let debug_output = format!("{:?}", config.database);

        assert!(debug_output.contains("localhost"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
        assert!(!debug_output.contains("hunter2"));
    }
}
