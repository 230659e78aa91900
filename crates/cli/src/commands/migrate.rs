//! Database migration command.
//!
//! Migrations are embedded from `crates/server/migrations/`; the server also
//! applies them at startup, so this is for preparing a database ahead of a
//! deploy.

use ecohome_server::db;

use super::{CommandError, connect};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!(
        available = db::MIGRATOR.iter().count(),
        "Running migrations..."
    );
    db::run_migrations(&pool).await?;
    tracing::info!("Migrations complete!");

    pool.close().await;
    Ok(())
}
