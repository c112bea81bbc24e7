//! Error types for actgate
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Every failure is surfaced at the boundary of the request that
/// triggered it. Nothing here is retried.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid client input (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, malformed or unverifiable session token (401)
    ///
    /// Carries no detail so the client cannot tell which part of the
    /// token was wrong.
    #[error("Authentication required")]
    Unauthorized,

    /// Provider answered with a non-success status or an unreadable body (502)
    #[error("Upstream error: {message} (HTTP {status})")]
    Upstream {
        message: String,
        status: u16,
        body: String,
    },

    /// Provider rejected the user registration call (502)
    #[error("User registration failed: HTTP {status}")]
    RegistrationFailed { status: u16, body: String },

    /// Transport failure talking to the provider (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Metric label for this error kind
    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized => "unauthorized",
            AppError::Upstream { .. } => "upstream",
            AppError::RegistrationFailed { .. } => "registration_failed",
            AppError::HttpClient(_) => "http_client",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Upstream failures keep the provider's status and body for
    /// diagnosis. Internal failures never leak detail to the client.
    fn into_response(self) -> Response {
        use axum::Json;

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind()])
            .inc();

        let (status, body) = match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Upstream {
                message,
                status,
                body,
            } => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "error": message,
                    "upstream_status": status,
                    "upstream_body": body,
                }),
            ),
            AppError::RegistrationFailed { status, body } => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "error": "User registration failed",
                    "upstream_status": status,
                    "upstream_body": body,
                }),
            ),
            AppError::HttpClient(_) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "Upstream request failed" }),
            ),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
