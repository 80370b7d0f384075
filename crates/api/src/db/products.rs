//! `PostgreSQL` product store.
//!
//! Queries are checked at runtime (`query_as` with a manual [`FromRow`]) so
//! the crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};

use stockroom_core::{Page, PageRequest, Price, ProductId};

use super::{ProductStore, RepositoryError};
use crate::models::{Product, ProductFields};

const PRODUCT_COLUMNS: &str = "id, name, category, price, quantity, active, created_at";

/// Product store backed by the `products` table.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_products(&self, sql: &str) -> Result<Vec<Product>, RepositoryError> {
        Ok(query_as::<Postgres, Product>(sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(query_as::<Postgres, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        self.fetch_products(&sql).await
    }

    async fn save(
        &self,
        id: Option<ProductId>,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let Some(id) = id else {
            let sql = format!(
                r"
                INSERT INTO products (name, category, price, quantity, active)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {PRODUCT_COLUMNS}
                "
            );
            return query_as::<Postgres, Product>(&sql)
                .bind(&fields.name)
                .bind(&fields.category)
                .bind(fields.price)
                .bind(fields.quantity)
                .bind(fields.active)
                .fetch_one(&self.pool)
                .await
                .map_err(map_write_error);
        };

        let sql = format!(
            r"
            UPDATE products
            SET name = $2, category = $3, price = $4, quantity = $5, active = $6
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        query_as::<Postgres, Product>(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.category)
            .bind(fields.price)
            .bind(fields.quantity)
            .bind(fields.active)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError> {
        let result = query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(
            query_scalar::<Postgres, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn count_by_category(&self, category: &str) -> Result<u64, RepositoryError> {
        let count = query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM products WHERE category = $1",
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        to_count(count)
    }

    async fn find_active_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active AND category = $1 ORDER BY id"
        );
        Ok(query_as::<Postgres, Product>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_price_range(
        &self,
        min: Price,
        max: Price,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE price BETWEEN $1 AND $2 ORDER BY id"
        );
        Ok(query_as::<Postgres, Product>(&sql)
            .bind(min)
            .bind(max)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_top_by_price_desc(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY price DESC, id ASC LIMIT $1"
        );
        Ok(query_as::<Postgres, Product>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_quantity(&self, id: ProductId, quantity: i32) -> Result<u64, RepositoryError> {
        let result = query("UPDATE products SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    async fn update_price_and_quantity(
        &self,
        id: ProductId,
        price: Price,
        quantity: i32,
    ) -> Result<u64, RepositoryError> {
        let result = query("UPDATE products SET price = $2, quantity = $3 WHERE id = $1")
            .bind(id)
            .bind(price)
            .bind(quantity)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected())
    }

    async fn average_price_by_category(&self) -> Result<Vec<(String, Decimal)>, RepositoryError> {
        Ok(query_as::<Postgres, (String, Decimal)>(
            r"
            SELECT category, AVG(price) AS average_price
            FROM products
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Product>, RepositoryError> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ANY($1) ORDER BY id"
        );
        Ok(query_as::<Postgres, Product>(&sql)
            .bind(categories)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_active_paged(
        &self,
        request: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let offset = i64::try_from(request.offset())
            .map_err(|_| RepositoryError::DataCorruption("page offset out of range".to_owned()))?;

        // Count and slice from the same snapshot so the totals match the items.
        let mut tx = self.pool.begin().await?;
        query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total = query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM products WHERE active")
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE active ORDER BY id LIMIT $1 OFFSET $2"
        );
        let items = query_as::<Postgres, Product>(&sql)
            .bind(i64::from(request.size()))
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Page::new(items, request, to_count(total)?))
    }

    async fn find_created_after(&self, date: NaiveDate) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (created_at AT TIME ZONE 'UTC')::date > $1
            ORDER BY created_at, id
            "
        );
        Ok(query_as::<Postgres, Product>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let amount: Decimal = row.try_get("price")?;
        let price = Price::new(amount).map_err(|e| sqlx::Error::ColumnDecode {
            index: "price".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            price,
            quantity: row.try_get("quantity")?,
            active: row.try_get("active")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

/// Translate constraint violations on writes into repository errors.
fn map_write_error(error: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = error {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict("product name already exists".to_owned());
        }
        if db_err.is_check_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return RepositoryError::Constraint(constraint.to_owned());
        }
    }
    RepositoryError::from(error)
}

fn to_count(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {value}")))
}
