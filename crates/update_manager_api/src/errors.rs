//! Error handling and HTTP error conversion
//!
//! Domain errors from `update_manager_core` are converted to HTTP responses
//! with a status code matching the error kind. Every error body has the same
//! shape:
//!
//! ```json
//! { "error": "File not found: missing.update", "code": "NotFound" }
//! ```

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use update_manager_core::{CatalogError, InputError, PackageError, ScriptError};

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Standard error response for all API errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,

    /// Machine-readable error code
    pub code: String,
}

/// Errors returned by handlers.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler() -> Result<Json<Response>, ApiError> {
///     let result = domain_operation()?; // Converts domain error to ApiError
///     Ok(Json(result.into()))
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// HTTP status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Catalog(err) => match err {
                CatalogError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound"),
                CatalogError::Forbidden { .. } => (StatusCode::FORBIDDEN, "Forbidden"),
                CatalogError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "InvalidRequest"),
                CatalogError::Internal { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
                }
            },
            ApiError::Input(err) => match err {
                InputError::Write { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
                _ => (StatusCode::BAD_REQUEST, "ValidationError"),
            },
            ApiError::Package(err) => match err {
                PackageError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
                _ => (StatusCode::BAD_REQUEST, "ValidationError"),
            },
            ApiError::Script(err) => match err {
                ScriptError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound"),
                ScriptError::TimedOut { .. } => (StatusCode::GATEWAY_TIMEOUT, "ScriptTimeout"),
                ScriptError::Spawn { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "ScriptError"),
            },
            ApiError::Multipart(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PayloadTooLarge")
            }
            ApiError::Multipart(_) | ApiError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "ValidationError")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        }
    }

    /// Convert into the status code and body sent to the client.
    pub fn to_response_parts(&self) -> (StatusCode, ErrorResponse) {
        let (status, code) = self.status_and_code();
        (
            status,
            ErrorResponse {
                error: self.to_string(),
                code: code.to_string(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_response_parts();

        // Log error server-side
        log_error(&self, status);

        (status, Json(error_response)).into_response()
    }
}

/// Log error with appropriate level based on HTTP status
fn log_error(error: &ApiError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!("API error: {} - {}", status, error);
    } else if status.is_client_error() {
        tracing::warn!("API error: {} - {}", status, error);
    } else {
        tracing::info!("API error: {} - {}", status, error);
    }
}
