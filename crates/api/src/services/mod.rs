//! Business logic services.
//!
//! # Services
//!
//! - `products` - Catalog rules (unique names, validation, reporting)

mod error;
pub mod products;

pub use error::ServiceError;
pub use products::ProductService;
