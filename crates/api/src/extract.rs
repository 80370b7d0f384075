//! Request extractors that reject with [`AppError`].
//!
//! Drop-in replacements for axum's `Json`, `Query` and `Path`, so malformed
//! input is answered with the same JSON error body as every other failure.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query},
};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
