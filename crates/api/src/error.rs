//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Failures leave the process
//! as a JSON body:
//!
//! ```json
//! {"status": 404, "error": "Not Found", "message": "...", "timestamp": "..."}
//! ```
//!
//! Storage failures are captured to Sentry and answered with a generic
//! message; their details stay in the logs.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::services::ServiceError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request could not be extracted (bad JSON, query or path).
    #[error("{0}")]
    BadRequest(String),

    /// The request body is not declared as JSON.
    #[error("{0}")]
    UnsupportedMediaType(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
    message: String,
    timestamp: DateTime<Utc>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Business(_) => StatusCode::CONFLICT,
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown"),
            message,
            timestamp: Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                Self::UnsupportedMediaType(rejection.body_text())
            }
            _ => Self::BadRequest(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockroom_core::ProductId;

    use super::*;
    use crate::db::RepositoryError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: impl Into<AppError>) -> StatusCode {
            err.into().into_response().status()
        }

        assert_eq!(
            get_status(ServiceError::NotFound(ProductId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::Business("taken".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::Repository(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::from(ServiceError::NotFound(ProductId::new(7))).into_response();
        let body = body_json(response).await;

        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "product not found with id: 7");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let err = ServiceError::Repository(RepositoryError::DataCorruption(
            "secret detail".to_string(),
        ));
        let body = body_json(AppError::from(err).into_response()).await;

        assert_eq!(body["status"], 500);
        assert_eq!(body["message"], "Internal server error");
    }
}
