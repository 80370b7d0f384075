//! Core types for Stockroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod page;
pub mod price;

pub use id::*;
pub use page::{Page, PageRequest, PageRequestError};
pub use price::{Price, PriceError};
