//! Error types and handling
//!
//! Every failure leaving the API is rendered as the standard envelope
//! `{"Timestamp": <unix seconds>, "Error": "<message>"}` with a status code
//! chosen by the error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::api::envelope::ErrorEnvelope;
use crate::models::InvalidCertificateState;
use crate::services::query::InvalidPredicate;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed caller input (400)
    #[error("{0}")]
    Validation(String),

    /// Unknown view or certificate (404)
    #[error("{0}")]
    NotFound(String),

    /// Mutation refused by local policy, e.g. a read-only CA (403)
    #[error("{0}")]
    Forbidden(String),

    /// Non-success response, network failure or undecodable body from
    /// PuppetDB or the Puppet CA (500)
    #[error("{0}")]
    Upstream(String),

    /// Operation not defined for the certificate's state (500)
    ///
    /// Not raised today: clean matches every state of a closed enum. Kept so
    /// the error taxonomy stays complete for callers.
    #[error("{0}")]
    InvalidTransition(String),

    /// The upstream service needed for this request is not configured (503)
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and a short kind label used in logs
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error"),
            AppError::InvalidTransition(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_transition")
            }
            AppError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();

        // Log server errors
        if status.is_server_error() {
            error!(error = %self, error_type = error_type, "Request error");
        }

        (status, Json(ErrorEnvelope::new(self.to_string()))).into_response()
    }
}

// Implement From for common error types

impl From<InvalidCertificateState> for AppError {
    fn from(err: InvalidCertificateState) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<InvalidPredicate> for AppError {
    fn from(err: InvalidPredicate) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Upstream(format!("request timed out: {}", err))
        } else if err.is_connect() {
            AppError::Upstream(format!("failed to connect: {}", err))
        } else if err.is_decode() {
            AppError::Upstream(format!("failed to decode response: {}", err))
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
