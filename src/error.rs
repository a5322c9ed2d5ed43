//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing sessions, bad credentials, CSRF failures
/// - **Resource Errors**: Requested resources not found or not visible
/// - **Business Logic Errors**: Illegal status transitions, exhausted budgets
/// - **Integration Errors**: PayPal/Spotify failures or missing configuration
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session token is missing, unknown, or expired.
    #[error("Authentication required")]
    Unauthorized,

    /// Email/password pair did not match a user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Authenticated, but not allowed to perform this action.
    #[error("{0}")]
    Forbidden(String),

    /// CSRF token missing, malformed, expired, or signed for another user.
    #[error("CSRF token missing or invalid")]
    CsrfRejected,

    /// Requested resource does not exist or is not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request conflicts with existing state (e.g., duplicate email).
    #[error("{0}")]
    Conflict(String),

    /// Request body or parameters are invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Request body failed declarative validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Status change not allowed from the current status.
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Campaign budget cannot cover another payout.
    #[error("Campaign budget is exhausted")]
    InsufficientBudget,

    /// PayPal or Spotify returned an error or an unexpected response.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// An optional integration was not configured for this deployment.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Unexpected internal failure (hashing, serialization).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::CsrfRejected => (StatusCode::FORBIDDEN, "csrf_rejected"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::InvalidTransition { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition")
            }
            AppError::InsufficientBudget => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_budget")
            }
            AppError::ExternalService(_) => (StatusCode::BAD_GATEWAY, "external_service_error"),
            AppError::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable"),
            AppError::Database(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database and internal errors are logged and replaced by a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "An internal error occurred".to_string()
            }
            AppError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
