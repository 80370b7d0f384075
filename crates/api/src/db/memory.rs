//! In-memory product store.
//!
//! Mirrors the `PostgreSQL` store's observable behavior (id assignment,
//! unique names, ordering) without a database. Backs the test suites.

use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use stockroom_core::{Page, PageRequest, Price, ProductId};

use super::{ProductStore, RepositoryError};
use crate::models::{Product, ProductFields};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

impl Table {
    fn name_taken(&self, name: &str, except: Option<ProductId>) -> bool {
        self.rows
            .values()
            .any(|p| p.name == name && Some(p.id) != except)
    }

    fn filtered(&self, predicate: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.rows.values().filter(|p| predicate(p)).cloned().collect()
    }
}

/// Product store holding rows in a process-local table.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<Table>,
}

impl InMemoryProductStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product with a fixed creation time.
    ///
    /// Lets tests place products on specific dates, which the public
    /// contract never allows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub fn insert_with_created_at(
        &self,
        fields: &ProductFields,
        created_at: DateTime<Utc>,
    ) -> Result<Product, RepositoryError> {
        let mut table = self.write()?;
        insert(&mut table, fields, created_at)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, RepositoryError> {
        self.table
            .read()
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, RepositoryError> {
        self.table
            .write()
            .map_err(|e| RepositoryError::Unavailable(e.to_string()))
    }
}

fn insert(
    table: &mut Table,
    fields: &ProductFields,
    created_at: DateTime<Utc>,
) -> Result<Product, RepositoryError> {
    if table.name_taken(&fields.name, None) {
        return Err(RepositoryError::Conflict(
            "product name already exists".to_owned(),
        ));
    }

    table.next_id += 1;
    let product = Product {
        id: ProductId::new(table.next_id),
        name: fields.name.clone(),
        category: fields.category.clone(),
        price: fields.price,
        quantity: fields.quantity,
        active: fields.active,
        created_at,
    };
    table.rows.insert(product.id, product.clone());
    Ok(product)
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.read()?.rows.values().cloned().collect())
    }

    async fn save(
        &self,
        id: Option<ProductId>,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let mut table = self.write()?;

        let Some(id) = id else {
            return insert(&mut table, fields, Utc::now());
        };

        if !table.rows.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if table.name_taken(&fields.name, Some(id)) {
            return Err(RepositoryError::Conflict(
                "product name already exists".to_owned(),
            ));
        }

        let product = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        product.apply(fields.clone());
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<u64, RepositoryError> {
        Ok(u64::from(self.write()?.rows.remove(&id).is_some()))
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.read()?.name_taken(name, None))
    }

    async fn count_by_category(&self, category: &str) -> Result<u64, RepositoryError> {
        let table = self.read()?;
        Ok(table.rows.values().filter(|p| p.category == category).count() as u64)
    }

    async fn find_active_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .read()?
            .filtered(|p| p.active && p.category == category))
    }

    async fn find_by_price_range(
        &self,
        min: Price,
        max: Price,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .read()?
            .filtered(|p| min <= p.price && p.price <= max))
    }

    async fn find_top_by_price_desc(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.list().await?;
        // Rows come out in id order, and the sort is stable, so ties stay id-ascending.
        products.sort_by(|a, b| b.price.cmp(&a.price));
        products.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(products)
    }

    async fn update_quantity(&self, id: ProductId, quantity: i32) -> Result<u64, RepositoryError> {
        let mut table = self.write()?;
        Ok(table.rows.get_mut(&id).map_or(0, |product| {
            product.quantity = quantity;
            1
        }))
    }

    async fn update_price_and_quantity(
        &self,
        id: ProductId,
        price: Price,
        quantity: i32,
    ) -> Result<u64, RepositoryError> {
        let mut table = self.write()?;
        Ok(table.rows.get_mut(&id).map_or(0, |product| {
            product.price = price;
            product.quantity = quantity;
            1
        }))
    }

    async fn average_price_by_category(&self) -> Result<Vec<(String, Decimal)>, RepositoryError> {
        let table = self.read()?;

        let mut sums: BTreeMap<&str, (Decimal, u32)> = BTreeMap::new();
        for product in table.rows.values() {
            let (sum, count) = sums.entry(product.category.as_str()).or_default();
            *sum = sum.checked_add(product.price.amount()).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "price total overflowed for {}",
                    product.category
                ))
            })?;
            *count += 1;
        }

        Ok(sums
            .into_iter()
            .map(|(category, (sum, count))| (category.to_owned(), sum / Decimal::from(count)))
            .collect())
    }

    async fn find_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Product>, RepositoryError> {
        let wanted: HashSet<&str> = categories.iter().map(String::as_str).collect();
        Ok(self
            .read()?
            .filtered(|p| wanted.contains(p.category.as_str())))
    }

    async fn find_active_paged(
        &self,
        request: PageRequest,
    ) -> Result<Page<Product>, RepositoryError> {
        let table = self.read()?;
        let active = table.rows.values().filter(|p| p.active);

        let total = active.clone().count() as u64;
        let items = active
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, request, total))
    }

    async fn find_created_after(&self, date: NaiveDate) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.read()?.filtered(|p| p.created_at.date_naive() > date);
        products.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(products)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fields(name: &str, category: &str, price: &str, active: bool) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            category: category.to_string(),
            price: price.parse().unwrap(),
            quantity: 1,
            active,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let store = InMemoryProductStore::new();
        let a = store.save(None, &fields("A", "X", "1", true)).await.unwrap();
        let b = store.save(None, &fields("B", "X", "2", true)).await.unwrap();

        assert_eq!(a.id, ProductId::new(1));
        assert_eq!(b.id, ProductId::new(2));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryProductStore::new();
        let a = store.save(None, &fields("A", "X", "1", true)).await.unwrap();
        assert_eq!(store.delete(a.id).await.unwrap(), 1);

        let b = store.save(None, &fields("B", "X", "1", true)).await.unwrap();
        assert_eq!(b.id, ProductId::new(2));
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_name() {
        let store = InMemoryProductStore::new();
        store.save(None, &fields("A", "X", "1", true)).await.unwrap();

        let result = store.save(None, &fields("A", "Y", "2", true)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_own_name_but_rejects_others() {
        let store = InMemoryProductStore::new();
        let a = store.save(None, &fields("A", "X", "1", true)).await.unwrap();
        store.save(None, &fields("B", "X", "1", true)).await.unwrap();

        let same = store.save(Some(a.id), &fields("A", "Z", "5", false)).await.unwrap();
        assert_eq!(same.category, "Z");
        assert_eq!(same.created_at, a.created_at);

        let clash = store.save(Some(a.id), &fields("B", "Z", "5", false)).await;
        assert!(matches!(clash, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let store = InMemoryProductStore::new();
        let result = store
            .save(Some(ProductId::new(9)), &fields("A", "X", "1", true))
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_targeted_updates_report_affected_rows() {
        let store = InMemoryProductStore::new();
        let a = store.save(None, &fields("A", "X", "1", true)).await.unwrap();

        assert_eq!(store.update_quantity(a.id, 40).await.unwrap(), 1);
        assert_eq!(store.update_quantity(ProductId::new(77), 40).await.unwrap(), 0);
        assert_eq!(
            store
                .update_price_and_quantity(a.id, "3.50".parse().unwrap(), 2)
                .await
                .unwrap(),
            1
        );

        let updated = store.get(a.id).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(updated.price, "3.5".parse::<Price>().unwrap());
    }

    #[tokio::test]
    async fn test_top_by_price_breaks_ties_by_id() {
        let store = InMemoryProductStore::new();
        let a = store.save(None, &fields("A", "X", "5", true)).await.unwrap();
        let b = store.save(None, &fields("B", "X", "9", true)).await.unwrap();
        let c = store.save(None, &fields("C", "X", "5", true)).await.unwrap();
        store.save(None, &fields("D", "X", "1", true)).await.unwrap();

        let ids: Vec<_> = store
            .find_top_by_price_desc(3)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[tokio::test]
    async fn test_created_after_excludes_same_day() {
        let store = InMemoryProductStore::new();
        let day = |d| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap();
        store
            .insert_with_created_at(&fields("Old", "X", "1", true), day(1))
            .unwrap();
        store
            .insert_with_created_at(&fields("Same", "X", "1", true), day(2))
            .unwrap();
        let newer = store
            .insert_with_created_at(&fields("New", "X", "1", true), day(3))
            .unwrap();

        let found = store
            .find_created_after(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(found, vec![newer]);
    }

    #[tokio::test]
    async fn test_find_by_categories_empty_set() {
        let store = InMemoryProductStore::new();
        store.save(None, &fields("A", "X", "1", true)).await.unwrap();
        assert!(store.find_by_categories(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(InMemoryProductStore::new().ping().await.is_ok());
    }
}
