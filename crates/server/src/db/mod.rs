//! Database operations for the EcoHome `PostgreSQL` store.
//!
//! # Database: `sustainability`
//!
//! ## Tables
//!
//! - `households` - Registered households (name, postcode, occupant count)
//! - `usage_entries` - Water and energy readings, cascade-deleted with their household
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! binary. The server applies them at startup; they can also be run with:
//! ```bash
//! cargo run -p ecohome-cli -- migrate
//! ```

pub mod households;
pub mod usage;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use households::HouseholdRepository;
pub use usage::UsageRepository;

/// Schema migrations embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a check constraint rejected a value).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Errors raised while bringing the database up at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The connection settings could not be turned into connect options.
    #[error("invalid database configuration: {0}")]
    InvalidConfig(#[source] sqlx::Error),

    /// The database never answered the probe query.
    #[error("could not connect to database after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    /// Applying migrations failed.
    #[error("migration failed: {0}")]
    Migration(#[from] MigrateError),
}

/// Build connect options from configuration.
///
/// `DATABASE_URL` wins when present; otherwise the discrete host/port/name/user/password
/// settings are used.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if the URL cannot be parsed.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    if let Some(url) = &config.url {
        return PgConnectOptions::from_str(url.expose_secret());
    }

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(config.password.expose_secret()))
}

/// Create a bounded `PostgreSQL` connection pool.
///
/// The pool connects lazily: no connection is opened until the first query, so
/// startup can probe it with [`wait_for_database`]. A request that cannot get a
/// connection within `acquire_timeout` fails instead of queuing indefinitely.
///
/// # Errors
///
/// Returns `StartupError::InvalidConfig` if the connection settings are invalid.
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool, StartupError> {
    let options = connect_options(config).map_err(StartupError::InvalidConfig)?;

    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .connect_lazy_with(options))
}

/// Run the trivial probe query used by health checks.
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can be acquired or the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Poll the database until it answers, waiting `delay` between attempts.
///
/// # Errors
///
/// Returns `StartupError::Unreachable` with the last error once `max_attempts`
/// probes have failed.
pub async fn wait_for_database(
    pool: &PgPool,
    max_attempts: u32,
    delay: Duration,
) -> Result<(), StartupError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match ping(pool).await {
            Ok(()) => {
                tracing::info!(attempt, "Database connection established");
                return Ok(());
            }
            Err(source) if attempt >= max_attempts => {
                return Err(StartupError::Unreachable {
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "Waiting for database"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns `StartupError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StartupError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database tables ready");
    Ok(())
}

/// Map constraint violations on writes to repository errors.
///
/// A foreign-key violation means the referenced household does not exist
/// (or was deleted concurrently), so it becomes `NotFound`.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
        if db_err.is_check_violation() {
            return RepositoryError::Conflict(db_err.message().to_owned());
        }
    }
    RepositoryError::Database(e)
}
