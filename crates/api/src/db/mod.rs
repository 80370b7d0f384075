//! Product storage.
//!
//! # Database: `stockroom`
//!
//! ## Tables
//!
//! - `products` - Catalog entries (unique `name`, non-negative `price`/`quantity`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stockroom-cli -- migrate
//! ```
//!
//! # Backends
//!
//! [`ProductStore`] is the persistence contract. [`PgProductStore`] is the
//! production backend; [`InMemoryProductStore`] backs the test suites.

pub mod memory;
pub mod products;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stockroom_core::{Page, PageRequest, Price, ProductId};

use crate::config::PoolConfig;
use crate::models::{Product, ProductFields};

pub use memory::InMemoryProductStore;
pub use products::PgProductStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (the product name is taken).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Check constraint violation (a value the table refuses to hold).
    #[error("check constraint violated: {0}")]
    Constraint(String),

    /// The in-process store is unusable (a writer panicked mid-update).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::ColumnDecode { index, source } => {
                Self::DataCorruption(format!("column {index}: {source}"))
            }
            other => Self::Database(other),
        }
    }
}

/// Persistence contract over the product table.
///
/// Absence is reported in-band (`Option`, affected row counts); turning it
/// into a domain error is the caller's decision.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch one product.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Every product, ordered by id.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Insert when `id` is `None` (the store assigns `id` and `created_at`),
    /// otherwise overwrite every mutable field of `id`.
    ///
    /// Returns `RepositoryError::NotFound` if `id` does not exist,
    /// `RepositoryError::Conflict` if the name is taken and
    /// `RepositoryError::Constraint` if a field breaks a table check.
    async fn save(
        &self,
        id: Option<ProductId>,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError>;

    /// Delete by id, returning the number of rows removed.
    async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError>;

    /// Whether a product with exactly this name exists.
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError>;

    /// Number of products in `category`, active or not.
    async fn count_by_category(&self, category: &str) -> Result<u64, RepositoryError>;

    /// Active products in `category`, ordered by id.
    async fn find_active_by_category(&self, category: &str)
    -> Result<Vec<Product>, RepositoryError>;

    /// Products with `min <= price <= max`, ordered by id.
    async fn find_by_price_range(
        &self,
        min: Price,
        max: Price,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// The `limit` most expensive products; equal prices are ordered by id.
    async fn find_top_by_price_desc(&self, limit: u32) -> Result<Vec<Product>, RepositoryError>;

    /// Set `quantity` on one row without reading it first.
    async fn update_quantity(&self, id: ProductId, quantity: i32) -> Result<u64, RepositoryError>;

    /// Set `price` and `quantity` on one row without reading it first.
    async fn update_price_and_quantity(
        &self,
        id: ProductId,
        price: Price,
        quantity: i32,
    ) -> Result<u64, RepositoryError>;

    /// `(category, mean price)` for each category present.
    async fn average_price_by_category(&self) -> Result<Vec<(String, Decimal)>, RepositoryError>;

    /// Products whose category is one of `categories`, ordered by id.
    async fn find_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Product>, RepositoryError>;

    /// One page of active products, ordered by id.
    async fn find_active_paged(
        &self,
        request: PageRequest,
    ) -> Result<Page<Product>, RepositoryError>;

    /// Products whose UTC creation date is after `date`, oldest first.
    async fn find_created_after(&self, date: NaiveDate) -> Result<Vec<Product>, RepositoryError>;

    /// Connectivity probe for readiness checks.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `pool` - Pool sizing and timeout settings
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    pool: &PoolConfig,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(pool.acquire_timeout)
        .connect(database_url.expose_secret())
        .await
}

/// Create a small pool for one-shot tools (migrations, seeding).
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_tool_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations from `crates/api/migrations/`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_decode_is_data_corruption() {
        let error = sqlx::Error::ColumnDecode {
            index: "price".to_owned(),
            source: Box::new(stockroom_core::PriceError::Negative(Decimal::NEGATIVE_ONE)),
        };

        match RepositoryError::from(error) {
            RepositoryError::DataCorruption(message) => {
                assert!(message.starts_with("column price:"), "{message}");
            }
            other => panic!("expected DataCorruption, got {other:?}"),
        }
    }

    #[test]
    fn test_other_sqlx_errors_stay_database() {
        assert!(matches!(
            RepositoryError::from(sqlx::Error::RowNotFound),
            RepositoryError::Database(_)
        ));
    }
}
