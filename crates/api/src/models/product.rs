//! Product domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Price, ProductId};

/// Average price per category, keyed by category name.
pub type CategoryAverages = BTreeMap<String, Price>;

/// A catalog product (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned ID.
    pub id: ProductId,
    /// Unique display name.
    pub name: String,
    /// Free-text grouping label.
    pub category: String,
    /// Unit price.
    pub price: Price,
    /// Units in stock.
    pub quantity: i32,
    /// Whether the product is currently offered.
    pub active: bool,
    /// When the product was created. Never changes.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The mutable fields of this product.
    #[must_use]
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price,
            quantity: self.quantity,
            active: self.active,
        }
    }

    /// Overwrite every mutable field, keeping `id` and `created_at`.
    pub fn apply(&mut self, fields: ProductFields) {
        self.name = fields.name;
        self.category = fields.category;
        self.price = fields.price;
        self.quantity = fields.quantity;
        self.active = fields.active;
    }
}

/// The validated, mutable part of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub quantity: i32,
    pub active: bool,
}

/// Validation failures for product payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("quantity must not be negative (got {0})")]
    NegativeQuantity(i32),
}

/// Request payload for creating or fully replacing a product.
///
/// `id` and `createdAt` are ignored if a client sends them. Omitted
/// `quantity` and `active` fall back to `0` and `true`, which means a full
/// replace that leaves them out resets them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl ProductInput {
    /// Longest accepted product name.
    pub const MAX_NAME_LENGTH: usize = 255;
    /// Longest accepted category label.
    pub const MAX_CATEGORY_LENGTH: usize = 100;

    /// Validate the payload, trimming surrounding whitespace from text fields.
    ///
    /// # Errors
    ///
    /// Returns `ProductValidationError` if a text field is blank or too long,
    /// or if `quantity` is negative.
    pub fn validate(self) -> Result<ProductFields, ProductValidationError> {
        let name = validate_text("name", &self.name, Self::MAX_NAME_LENGTH)?;
        let category = validate_text("category", &self.category, Self::MAX_CATEGORY_LENGTH)?;
        validate_quantity(self.quantity)?;

        Ok(ProductFields {
            name,
            category,
            price: self.price,
            quantity: self.quantity,
            active: self.active,
        })
    }
}

/// Reject negative stock levels.
///
/// # Errors
///
/// Returns `ProductValidationError::NegativeQuantity` if `quantity < 0`.
pub const fn validate_quantity(quantity: i32) -> Result<(), ProductValidationError> {
    if quantity < 0 {
        return Err(ProductValidationError::NegativeQuantity(quantity));
    }
    Ok(())
}

fn validate_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ProductValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProductValidationError::Blank { field });
    }
    if trimmed.chars().count() > max {
        return Err(ProductValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(json: serde_json::Value) -> ProductInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_input_defaults_quantity_and_active() {
        let fields = input(serde_json::json!({
            "name": "Desk Lamp",
            "category": "Lighting",
            "price": 24.5
        }))
        .validate()
        .unwrap();

        assert_eq!(fields.quantity, 0);
        assert!(fields.active);
    }

    #[test]
    fn test_input_ignores_id_and_created_at() {
        let fields = input(serde_json::json!({
            "id": 99,
            "createdAt": "2020-01-01T00:00:00Z",
            "name": "Desk Lamp",
            "category": "Lighting",
            "price": 24.5,
            "quantity": 3,
            "active": false
        }))
        .validate()
        .unwrap();

        assert_eq!(fields.quantity, 3);
        assert!(!fields.active);
    }

    #[test]
    fn test_validate_trims_text() {
        let fields = input(serde_json::json!({
            "name": "  Desk Lamp ",
            "category": " Lighting",
            "price": 1
        }))
        .validate()
        .unwrap();

        assert_eq!(fields.name, "Desk Lamp");
        assert_eq!(fields.category, "Lighting");
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let err = input(serde_json::json!({"name": "   ", "category": "X", "price": 1}))
            .validate()
            .unwrap_err();
        assert_eq!(err, ProductValidationError::Blank { field: "name" });
        assert_eq!(err.to_string(), "name must not be blank");
    }

    #[test]
    fn test_validate_rejects_blank_category() {
        let err = input(serde_json::json!({"name": "A", "category": "", "price": 1}))
            .validate()
            .unwrap_err();
        assert_eq!(err, ProductValidationError::Blank { field: "category" });
    }

    #[test]
    fn test_validate_rejects_long_name() {
        let name = "n".repeat(ProductInput::MAX_NAME_LENGTH + 1);
        let err = input(serde_json::json!({"name": name, "category": "X", "price": 1}))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ProductValidationError::TooLong { field: "name", .. }));
    }

    #[test]
    fn test_validate_rejects_negative_quantity() {
        let err = input(serde_json::json!({
            "name": "A", "category": "X", "price": 1, "quantity": -4
        }))
        .validate()
        .unwrap_err();
        assert_eq!(err, ProductValidationError::NegativeQuantity(-4));
    }

    #[test]
    fn test_input_rejects_negative_price() {
        let result: Result<ProductInput, _> =
            serde_json::from_value(serde_json::json!({"name": "A", "category": "X", "price": -1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_input_rejects_unstorable_price() {
        for price in [serde_json::json!(0.125), serde_json::json!("10000000000.00")] {
            let result: Result<ProductInput, _> = serde_json::from_value(
                serde_json::json!({"name": "A", "category": "X", "price": price}),
            );
            assert!(result.is_err(), "price: {price}");
        }
    }

    #[test]
    fn test_apply_keeps_identity() {
        let created_at = Utc::now();
        let mut product = Product {
            id: ProductId::new(5),
            name: "Old".to_string(),
            category: "X".to_string(),
            price: Price::ZERO,
            quantity: 1,
            active: true,
            created_at,
        };

        product.apply(ProductFields {
            name: "New".to_string(),
            category: "Y".to_string(),
            price: "9.99".parse().unwrap(),
            quantity: 0,
            active: false,
        });

        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.created_at, created_at);
        assert_eq!(product.name, "New");
        assert_eq!(product.fields().category, "Y");
        assert!(!product.active);
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let product = Product {
            id: ProductId::new(1),
            name: "A".to_string(),
            category: "X".to_string(),
            price: "10".parse().unwrap(),
            quantity: 2,
            active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["price"], 10.0);
        assert!(json.get("createdAt").is_some());
    }
}
