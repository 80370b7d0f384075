//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                             - Liveness check
//! GET    /health/ready                       - Readiness check (store ping)
//!
//! # Products
//! GET    /api/products                       - List all products
//! POST   /api/products                       - Create (201 + Location)
//! GET    /api/products/{id}                  - Fetch one
//! PUT    /api/products/{id}                  - Replace every mutable field
//! DELETE /api/products/{id}                  - Delete (204)
//! PATCH  /api/products/{id}/quantity         - Set quantity (?quantity=)
//! PATCH  /api/products/{id}/price-quantity   - Set price and quantity
//! GET    /api/products/exists                - Name taken? (?name=)
//! GET    /api/products/count                 - Count in category (?category=)
//! GET    /api/products/active                - Active in category (?category=)
//! GET    /api/products/price-range           - ?minPrice=&maxPrice= (inclusive)
//! GET    /api/products/top-expensive         - Three most expensive
//! GET    /api/products/avg-price             - Mean price per category
//! GET    /api/products/by-categories         - ?categories=A,B&categories=C
//! GET    /api/products/active-paged          - ?page=&size= (page is 0-based)
//! GET    /api/products/added-after           - ?date=YYYY-MM-DD
//! ```

pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/exists", get(products::exists))
        .route("/count", get(products::count))
        .route("/active", get(products::active))
        .route("/price-range", get(products::price_range))
        .route("/top-expensive", get(products::top_expensive))
        .route("/avg-price", get(products::average_price))
        .route("/by-categories", get(products::by_categories))
        .route("/active-paged", get(products::active_paged))
        .route("/added-after", get(products::added_after))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/quantity", patch(products::update_quantity))
        .route(
            "/{id}/price-quantity",
            patch(products::update_price_quantity),
        )
}

/// Build all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest(products::BASE_PATH, product_routes())
}
