//! JSON body extractor whose rejections use the API error body

use axum::extract::FromRequest;

use super::error::ApiError;

/// `axum::Json` with malformed or mistyped bodies reported as `VALIDATION_ERROR` (400)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
