//! Product catalog service.
//!
//! Applies the catalog rules on top of a [`ProductStore`]: payload
//! validation, unique names, and translation of store outcomes (missing
//! rows, constraint violations) into [`ServiceError`]s.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use stockroom_core::{Page, PageRequest, Price, ProductId};

use super::ServiceError;
use crate::db::{ProductStore, RepositoryError};
use crate::models::{CategoryAverages, Product, ProductInput, validate_quantity};

/// Number of products returned by the "most expensive" report.
const TOP_EXPENSIVE_LIMIT: u32 = 3;

/// Product catalog service.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    /// Create a new product service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product_by_id(&self, id: ProductId) -> Result<Product, ServiceError> {
        debug!("Fetching product");
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// List every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_all_products(&self) -> Result<Vec<Product>, ServiceError> {
        let products = self.store.list().await?;
        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the payload is invalid.
    /// Returns `ServiceError::Business` if the name is already taken.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product, ServiceError> {
        let fields = input.validate()?;

        if self.store.exists_by_name(&fields.name).await? {
            return Err(duplicate_name(&fields.name));
        }

        // A concurrent insert can still win the race; the unique constraint
        // reports it as a conflict.
        let product = self
            .store
            .save(None, &fields)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => duplicate_name(&fields.name),
                other => other.into(),
            })?;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace every mutable field of a product.
    ///
    /// Omitted `quantity` and `active` in `input` reset to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the payload is invalid.
    /// Returns `ServiceError::NotFound` if no product has this id.
    /// Returns `ServiceError::Business` if the new name belongs to another product.
    #[instrument(skip(self, input), fields(product_id = %id, name = %input.name))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: ProductInput,
    ) -> Result<Product, ServiceError> {
        let fields = input.validate()?;
        let existing = self.get_product_by_id(id).await?;

        if fields.name != existing.name && self.store.exists_by_name(&fields.name).await? {
            return Err(duplicate_name(&fields.name));
        }

        let product = self
            .store
            .save(Some(id), &fields)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound(id),
                RepositoryError::Conflict(_) => duplicate_name(&fields.name),
                other => other.into(),
            })?;

        info!("Product updated");
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        self.get_product_by_id(id).await?;

        if self.store.delete(id).await? == 0 {
            return Err(ServiceError::NotFound(id));
        }

        info!("Product deleted");
        Ok(())
    }

    /// Whether a product with exactly this name exists.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn product_exists(&self, name: &str) -> Result<bool, ServiceError> {
        let exists = self.store.exists_by_name(name).await?;
        debug!(exists, "Checked product name");
        Ok(exists)
    }

    /// Number of products in a category, active or not.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn count_products_by_category(&self, category: &str) -> Result<u64, ServiceError> {
        let count = self.store.count_by_category(category).await?;
        debug!(count, "Counted products in category");
        Ok(count)
    }

    /// Active products in a category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_active_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, ServiceError> {
        let products = self.store.find_active_by_category(category).await?;
        debug!(count = products.len(), "Listed active products in category");
        Ok(products)
    }

    /// Products priced within `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `min > max`.
    #[instrument(skip(self), fields(min = %min, max = %max))]
    pub async fn get_products_by_price_range(
        &self,
        min: Price,
        max: Price,
    ) -> Result<Vec<Product>, ServiceError> {
        if min > max {
            return Err(ServiceError::Validation(format!(
                "minPrice ({min}) must not exceed maxPrice ({max})"
            )));
        }

        let products = self.store.find_by_price_range(min, max).await?;
        debug!(count = products.len(), "Listed products in price range");
        Ok(products)
    }

    /// The three most expensive products, highest price first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn get_top3_most_expensive_products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.find_top_by_price_desc(TOP_EXPENSIVE_LIMIT).await?)
    }

    /// Set the stock level of a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `quantity` is negative.
    /// Returns `ServiceError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_quantity(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        validate_quantity(quantity)?;

        if self.store.update_quantity(id, quantity).await? == 0 {
            return Err(ServiceError::NotFound(id));
        }

        info!("Product quantity updated");
        Ok(())
    }

    /// Set the price and stock level of a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if `quantity` is negative.
    /// Returns `ServiceError::NotFound` if no product has this id.
    #[instrument(skip(self), fields(product_id = %id, price = %price))]
    pub async fn update_product_price_and_quantity(
        &self,
        id: ProductId,
        price: Price,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        validate_quantity(quantity)?;

        if self
            .store
            .update_price_and_quantity(id, price, quantity)
            .await?
            == 0
        {
            return Err(ServiceError::NotFound(id));
        }

        info!("Product price and quantity updated");
        Ok(())
    }

    /// Mean price of each category present.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails or reports a
    /// negative average.
    #[instrument(skip(self))]
    pub async fn get_average_price_by_category(&self) -> Result<CategoryAverages, ServiceError> {
        let rows = self.store.average_price_by_category().await?;

        let mut averages = CategoryAverages::new();
        for (category, average) in rows {
            let price = Price::derived(average).map_err(|e| {
                RepositoryError::DataCorruption(format!("average for {category}: {e}"))
            })?;
            averages.insert(category, price.normalize());
        }

        debug!(categories = averages.len(), "Computed category averages");
        Ok(averages)
    }

    /// Products in any of `categories`.
    ///
    /// Labels are trimmed, blanks dropped and duplicates collapsed before the
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self, categories))]
    pub async fn get_products_by_categories<S: AsRef<str> + Sync>(
        &self,
        categories: &[S],
    ) -> Result<Vec<Product>, ServiceError> {
        let categories: Vec<String> = categories
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect();

        if categories.is_empty() {
            debug!("No categories requested");
            return Ok(Vec::new());
        }

        let products = self.store.find_by_categories(&categories).await?;
        debug!(
            categories = categories.len(),
            count = products.len(),
            "Listed products by categories"
        );
        Ok(products)
    }

    /// One page of active products, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self), fields(page = request.page(), size = request.size()))]
    pub async fn get_active_products(
        &self,
        request: PageRequest,
    ) -> Result<Page<Product>, ServiceError> {
        let page = self.store.find_active_paged(request).await?;
        debug!(
            items = page.items.len(),
            total = page.total_elements,
            "Fetched page of active products"
        );
        Ok(page)
    }

    /// Products created (UTC calendar date) after `date`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn get_products_added_after(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<Product>, ServiceError> {
        let products = self.store.find_created_after(date).await?;
        debug!(count = products.len(), "Listed products added after date");
        Ok(products)
    }
}

fn duplicate_name(name: &str) -> ServiceError {
    ServiceError::Business(format!("Product with name '{name}' already exists"))
}
