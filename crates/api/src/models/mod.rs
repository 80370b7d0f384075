//! Domain models for the product catalog.
//!
//! These types represent validated domain objects separate from database row
//! types and from the raw request payloads the API accepts.

pub mod product;

pub use product::{
    CategoryAverages, Product, ProductFields, ProductInput, ProductValidationError,
    validate_quantity,
};
