//! Subcommand implementations.

pub mod migrate;
pub mod score;
pub mod seed;

use sqlx::PgPool;
use thiserror::Error;

use ecohome_core::{HouseholdId, MembersError, NameError, PostcodeError};
use ecohome_server::config::{ConfigError, ServerConfig};
use ecohome_server::db::{self, RepositoryError, StartupError};

/// Errors returned by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid name: {0}")]
    Name(#[from] NameError),

    #[error("Invalid postcode: {0}")]
    Postcode(#[from] PostcodeError),

    #[error("Invalid members: {0}")]
    Members(#[from] MembersError),

    #[error("Household {0} not found")]
    HouseholdNotFound(HouseholdId),
}

/// Load configuration and connect, waiting for the database like the server does.
async fn connect() -> Result<PgPool, CommandError> {
    let config = ServerConfig::from_env()?;
    let pool = db::create_pool(&config.database)?;

    tracing::info!("Connecting to database...");
    db::wait_for_database(
        &pool,
        config.database.connect_max_retries,
        config.database.connect_retry_delay,
    )
    .await?;

    Ok(pool)
}
