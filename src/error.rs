// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Every core operation returns one of these kinds instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // Malformed input shape; the user retries the same step.
    Validation(String),

    // Unknown test id, or no match for a delete selection.
    NotFound(String),

    // Same learner, same test, same calendar day.
    Duplicate(String),

    // Store could not be written.
    Persistence(String),

    // Non-operator invoking an operator-only action.
    Unauthorized,

    // Transition requested from a step that does not allow it.
    InvalidState(String),

    // Bootstrap misconfiguration.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Duplicate(msg) => write!(f, "duplicate: {}", msg),
            AppError::Persistence(msg) => write!(f, "persistence error: {}", msg),
            AppError::Unauthorized => write!(f, "unauthorized"),
            AppError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Persistence(msg) | AppError::Config(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
