//! Integration tests for Stockroom.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stockroom-integration-tests
//! ```
//!
//! No database is needed: [`TestApp::spawn`] serves the real router on an
//! ephemeral port over the in-memory product store.
//!
//! The `PostgreSQL` store tests are ignored by default; run them with a
//! database at `DATABASE_URL`:
//!
//! ```bash
//! cargo test -p stockroom-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `products_api` - HTTP contract (status codes, headers, JSON shapes)
//! - `product_service` - Catalog rules exercised through `ProductService`
//! - `pg_product_store` - SQL behavior of `PgProductStore`

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tokio::task::JoinHandle;

use stockroom_api::db::InMemoryProductStore;
use stockroom_api::state::AppState;

/// A running API server backed by a fresh in-memory store.
pub struct TestApp {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub address: String,
    pub client: Client,
    /// The store behind the server, for arranging data the API cannot create.
    pub store: Arc<InMemoryProductStore>,
    handle: JoinHandle<()>,
}

impl TestApp {
    /// Start a server on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let store = Arc::new(InMemoryProductStore::new());
        let app = stockroom_api::app(AppState::new(store.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read test listener address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            address: format!("http://{addr}"),
            client: Client::new(),
            store,
            handle,
        }
    }

    /// Absolute URL for `path` (which starts with `/`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    /// `GET path`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET")
    }

    /// `POST /api/products` with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_product(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/api/products"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST")
    }

    /// Create a product and return its JSON representation.
    ///
    /// # Panics
    ///
    /// Panics unless the server answers 201 with a JSON body.
    pub async fn create_product(&self, body: &Value) -> Value {
        let resp = self.post_product(body).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "create failed for {body}");
        resp.json().await.expect("Failed to parse created product")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
