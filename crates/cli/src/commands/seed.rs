//! Seed the catalog with sample products.
//!
//! Products go through `ProductService`, so validation and the unique-name
//! rule apply exactly as they do for API clients. Names that already exist
//! are skipped, which makes the command safe to re-run.

use std::sync::Arc;

use tracing::{info, warn};

use stockroom_api::db::{self, PgProductStore};
use stockroom_api::models::ProductInput;
use stockroom_api::services::{ProductService, ServiceError};

use super::{CommandError, database_url};

/// Catalog used when no file is given.
const BUNDLED_CATALOG: &str = include_str!("../../seed/products.json");

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Seed products from `file`, or from the bundled catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the database is
/// unreachable, or a product is rejected by validation.
pub async fn run(file: Option<&str>) -> Result<(), CommandError> {
    let content = match file {
        Some(path) => {
            info!(path, "Loading products from file");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CommandError::Io {
                    path: path.to_owned(),
                    source,
                })?
        }
        None => BUNDLED_CATALOG.to_owned(),
    };

    // Parse before connecting so a bad file fails fast
    let products = parse_catalog(&content)?;
    info!(products = products.len(), "Parsed catalog");

    let database_url = database_url()?;
    let pool = db::create_tool_pool(&database_url).await?;
    info!("Connected to database");

    let service = ProductService::new(Arc::new(PgProductStore::new(pool)));
    let summary = seed(&service, products).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.inserted);
    info!("  Products skipped (already exist): {}", summary.skipped);

    Ok(())
}

fn parse_catalog(content: &str) -> Result<Vec<ProductInput>, CommandError> {
    Ok(serde_json::from_str(content)?)
}

/// Create each product, skipping names that are already taken.
///
/// # Errors
///
/// Returns the first error other than a duplicate name.
pub async fn seed(
    service: &ProductService,
    products: Vec<ProductInput>,
) -> Result<SeedSummary, ServiceError> {
    let mut summary = SeedSummary::default();

    for input in products {
        let name = input.name.clone();
        match service.create_product(input).await {
            Ok(product) => {
                info!(product_id = %product.id, name = %product.name, "Inserted");
                summary.inserted += 1;
            }
            Err(ServiceError::Business(reason)) => {
                warn!(%name, %reason, "Skipped");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockroom_api::db::InMemoryProductStore;

    use super::*;

    #[test]
    fn test_bundled_catalog_parses() {
        let products = parse_catalog(BUNDLED_CATALOG).unwrap();
        assert!(!products.is_empty());
        assert!(products.iter().all(|p| p.clone().validate().is_ok()));
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        let result = parse_catalog(r#"[{"name": "A", "category": "X", "price": -1}]"#);
        assert!(matches!(result, Err(CommandError::Parse(_))));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let service = ProductService::new(Arc::new(InMemoryProductStore::new()));
        let products = parse_catalog(BUNDLED_CATALOG).unwrap();
        let total = products.len();

        let first = seed(&service, products.clone()).await.unwrap();
        assert_eq!(first, SeedSummary { inserted: total, skipped: 0 });

        let second = seed(&service, products).await.unwrap();
        assert_eq!(second, SeedSummary { inserted: 0, skipped: total });
    }
}
