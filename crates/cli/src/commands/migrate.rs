//! Database migration command.
//!
//! Applies `crates/api/migrations/` to the database named by
//! `STOCKROOM_DATABASE_URL` (or `DATABASE_URL`).

use tracing::info;

use stockroom_api::db;

use super::{CommandError, database_url};

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable, or a
/// migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = db::create_tool_pool(&database_url).await?;

    info!("Running migrations...");
    db::run_migrations(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
