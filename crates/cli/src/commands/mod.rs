//! CLI subcommands.

pub mod migrate;
pub mod seed;

use stockroom_api::config::ConfigError;
use stockroom_api::services::ServiceError;

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid product file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("seeding failed: {0}")]
    Service(#[from] ServiceError),
}

/// Load `.env` and resolve the database URL.
fn database_url() -> Result<secrecy::SecretString, CommandError> {
    dotenvy::dotenv().ok();
    Ok(stockroom_api::config::get_database_url(
        "STOCKROOM_DATABASE_URL",
    )?)
}
