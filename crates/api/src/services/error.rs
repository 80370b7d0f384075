//! Service error types.

use thiserror::Error;

use stockroom_core::{PageRequestError, ProductId};

use crate::db::RepositoryError;
use crate::models::ProductValidationError;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No product has the requested id.
    #[error("product not found with id: {0}")]
    NotFound(ProductId),

    /// A domain rule was violated (e.g. duplicate name).
    #[error("{0}")]
    Business(String),

    /// Input is malformed or out of range.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Constraint(constraint) => {
                Self::Validation(format!("value rejected by constraint {constraint}"))
            }
            other => Self::Repository(other),
        }
    }
}

impl From<ProductValidationError> for ServiceError {
    fn from(err: ProductValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PageRequestError> for ServiceError {
    fn from(err: PageRequestError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_violation_is_validation() {
        let err = ServiceError::from(RepositoryError::Constraint(
            "products_quantity_non_negative".to_owned(),
        ));
        match err {
            ServiceError::Validation(message) => {
                assert!(message.contains("products_quantity_non_negative"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_other_repository_errors_pass_through() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::Repository(RepositoryError::NotFound)
        ));
    }
}
