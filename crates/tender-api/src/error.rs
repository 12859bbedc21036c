//! # API Error Types
//!
//! The error taxonomy every resource speaks, implementing
//! `axum::response::IntoResponse`. Validation errors carry their typed
//! field→message-list map in `error.details`; permission errors carry
//! one deliberately undiscriminating message; database errors are
//! redacted to a fixed string so raw driver errors never reach a client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The one message every permission failure returns. It never reveals
/// whether the entity exists, who owns it, or which check failed.
pub const PERMISSION_MESSAGE: &str = "You do not have permission to perform this action.";

/// The one message every persistence failure returns.
pub const DATABASE_MESSAGE: &str = "A database error occurred.";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// The field→message-list map, present only for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Content validation failed (400); carries the typed error map.
    #[error("request validation failed")]
    Validation(serde_json::Value),

    /// The actor may not perform this operation (401).
    #[error("{PERMISSION_MESSAGE}")]
    Permission,

    /// Resource not found — or not visible to this actor; the response
    /// never distinguishes the two (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Conflict with existing state, e.g. a duplicate proposal (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence failure (503). The inner message is logged, never
    /// returned.
    #[error("database error: {0}")]
    Database(String),

    /// Unexpected failure (500). The inner message is logged, never
    /// returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a validation error from a typed field-error struct.
    pub fn validation<E: Serialize>(errors: &E) -> Self {
        match serde_json::to_value(errors) {
            Ok(map) => Self::Validation(map),
            Err(e) => Self::Internal(format!("failed to serialize validation errors: {e}")),
        }
    }

    /// Build a validation error for a single field.
    pub fn invalid_field(field: &str, messages: Vec<String>) -> Self {
        Self::Validation(serde_json::json!({ field: messages }))
    }

    /// Build a validation error for a body that could not be parsed.
    pub fn malformed_body(reason: impl std::fmt::Display) -> Self {
        Self::Validation(serde_json::json!({ "body": [reason.to_string()] }))
    }

    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Permission => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Database(_) => (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose persistence or internal error messages to clients.
        let message = match &self {
            Self::Database(_) => DATABASE_MESSAGE.to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        let details = match &self {
            Self::Validation(map) => Some(map.clone()),
            _ => None,
        };

        // Log server-side errors for operator visibility.
        match &self {
            Self::Database(_) => tracing::error!(error = %self, "database error"),
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
