//! Stockroom CLI - database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! stockroom migrate
//!
//! # Load the bundled sample catalog
//! stockroom seed
//!
//! # Load products from a JSON file (array of product payloads)
//! stockroom seed --file products.json
//! ```
//!
//! Both commands read `STOCKROOM_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about = "Stockroom CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert sample products (existing names are skipped)
    Seed {
        /// JSON file with an array of products; defaults to the bundled catalog
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seed_file() {
        let cli = Cli::parse_from(["stockroom", "seed", "--file", "catalog.json"]);
        assert!(matches!(
            cli.command,
            Commands::Seed { file: Some(ref f) } if f == "catalog.json"
        ));
    }
}
