//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::ProductStore;
use crate::services::ProductService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; the store is passed in explicitly so the
/// same router runs against `PostgreSQL` or the in-memory backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn ProductStore>,
    products: ProductService,
}

impl AppState {
    /// Create a new application state over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        let products = ProductService::new(Arc::clone(&store));

        Self {
            inner: Arc::new(AppStateInner { store, products }),
        }
    }

    /// Get a reference to the product store.
    #[must_use]
    pub fn store(&self) -> &dyn ProductStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the product service.
    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }
}
