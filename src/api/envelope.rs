//! Uniform response envelope
//!
//! Every endpoint answers `{"Timestamp": <unix secs>, "Data": ...}` on
//! success and `{"Timestamp": <unix secs>, "Error": "..."}` on failure.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

/// Successful response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    pub timestamp: i64,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Failed response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorEnvelope {
    pub timestamp: i64,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            error: error.into(),
        }
    }
}
