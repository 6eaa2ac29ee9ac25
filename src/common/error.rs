// Error handling types for the API
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),
    Unauthenticated(String),
    InvalidCredential(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InvalidState(String),
    ExchangeFailed(String),
    IdentityTokenInvalid(String),
    MissingIdentityToken,
    NotConfigured(String),
    InternalServer(String),
    DatabaseError(sqlx::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::InvalidCredential(msg) => write!(f, "Invalid Credential: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InvalidState(msg) => write!(f, "Invalid State: {}", msg),
            ApiError::ExchangeFailed(msg) => write!(f, "Token Exchange Failed: {}", msg),
            ApiError::IdentityTokenInvalid(msg) => write!(f, "Identity Token Invalid: {}", msg),
            ApiError::MissingIdentityToken => write!(f, "Missing Identity Token"),
            ApiError::NotConfigured(msg) => write!(f, "Not Configured: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_)
            | ApiError::InvalidState(_)
            | ApiError::ExchangeFailed(_)
            | ApiError::IdentityTokenInvalid(_)
            | ApiError::MissingIdentityToken => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) | ApiError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotConfigured(_)
            | ApiError::InternalServer(_)
            | ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::ExchangeFailed(_) => "EXCHANGE_FAILED",
            ApiError::IdentityTokenInvalid(_) => "IDENTITY_TOKEN_INVALID",
            ApiError::MissingIdentityToken => "MISSING_IDENTITY_TOKEN",
            ApiError::NotConfigured(_) => "NOT_CONFIGURED",
            ApiError::InternalServer(_) => "INTERNAL_SERVER_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();

        let (error_message, detail) = match self {
            ApiError::ValidationError(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InvalidState(msg)
            | ApiError::NotConfigured(msg) => (msg, None),
            ApiError::InvalidCredential(detail) => ("Invalid token".to_string(), Some(detail)),
            ApiError::ExchangeFailed(detail) => {
                ("token_exchange_failed".to_string(), Some(detail))
            }
            ApiError::IdentityTokenInvalid(detail) => {
                ("id_token_invalid".to_string(), Some(detail))
            }
            ApiError::MissingIdentityToken => ("missing_id_token".to_string(), None),
            ApiError::InternalServer(msg) => {
                error!(error = %msg, "Internal server error");
                ("Internal server error".to_string(), None)
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                ("Database operation failed".to_string(), None)
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
            detail,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::ValidationError(rejection.body_text())
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}

/// True when the store rejected a write because of a UNIQUE constraint
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_exchange_failure_passes_detail_through() {
        let (status, body) =
            body_json(ApiError::ExchangeFailed("invalid_grant".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "token_exchange_failed");
        assert_eq!(body["detail"], "invalid_grant");
        assert_eq!(body["code"], "EXCHANGE_FAILED");
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        let (status, body) =
            body_json(ApiError::InternalServer("pool exhausted at 10.0.0.3".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("detail").is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredential("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidState("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MissingIdentityToken.status(),
            StatusCode::BAD_REQUEST
        );
    }
}
