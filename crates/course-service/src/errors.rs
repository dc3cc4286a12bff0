use crate::observability::ErrorCategory;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure taxonomy for every course-service operation.
///
/// Business variants are expected outcomes that callers translate into
/// responses. `Database`, `Crypto` and `Internal` are infrastructure failures;
/// their detail strings are logged but never sent to clients.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Course has no remaining seats")]
    CapacityExceeded,

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Internal server error")]
    Internal,
}

impl CmsError {
    /// Shorthand for a validation failure with a single violation.
    pub fn invalid(message: impl Into<String>) -> Self {
        CmsError::ValidationFailed(vec![message.into()])
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CmsError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            CmsError::Crypto(_) | CmsError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            CmsError::InvalidCredentials
            | CmsError::InvalidToken(_)
            | CmsError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            CmsError::Forbidden(_) => StatusCode::FORBIDDEN,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Conflict(_) | CmsError::CapacityExceeded => StatusCode::CONFLICT,
            CmsError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Bounded category used as a metrics label.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CmsError::InvalidCredentials
            | CmsError::InvalidToken(_)
            | CmsError::Unauthenticated(_) => ErrorCategory::Authentication,
            CmsError::Forbidden(_) => ErrorCategory::Authorization,
            CmsError::NotFound(_)
            | CmsError::Conflict(_)
            | CmsError::CapacityExceeded
            | CmsError::ValidationFailed(_) => ErrorCategory::Business,
            CmsError::Database(_) | CmsError::Crypto(_) | CmsError::Internal => {
                ErrorCategory::Internal
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retryable: Option<bool>,
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (code, message, violations, retryable) = match self {
            CmsError::Database(detail) => {
                tracing::error!(target: "cms.errors", error = %detail, "Persistence failure");
                (
                    "SERVICE_UNAVAILABLE",
                    "The service is temporarily unavailable".to_string(),
                    None,
                    Some(true),
                )
            }
            CmsError::Crypto(detail) => {
                tracing::error!(target: "cms.errors", error = %detail, "Cryptographic failure");
                (
                    "CRYPTO_ERROR",
                    "An internal cryptographic error occurred".to_string(),
                    None,
                    None,
                )
            }
            CmsError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
                None,
                None,
            ),
            CmsError::InvalidToken(reason) => ("INVALID_TOKEN", reason, None, None),
            CmsError::Unauthenticated(reason) => ("UNAUTHENTICATED", reason, None, None),
            CmsError::Forbidden(reason) => ("FORBIDDEN", reason, None, None),
            CmsError::NotFound(what) => ("NOT_FOUND", what, None, None),
            CmsError::Conflict(reason) => ("CONFLICT", reason, None, None),
            CmsError::CapacityExceeded => (
                "CAPACITY_EXCEEDED",
                "Course has no remaining seats".to_string(),
                None,
                None,
            ),
            CmsError::ValidationFailed(violations) => (
                "VALIDATION_FAILED",
                "Request validation failed".to_string(),
                Some(violations),
                None,
            ),
            CmsError::Internal => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
                None,
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code,
                message,
                violations,
                retryable,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
