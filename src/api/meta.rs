//! Version and capability endpoints

use axum::{extract::State, routing::get, Router};
use serde::Serialize;

use crate::api::envelope::Envelope;
use crate::AppState;

/// Build version
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionResponse {
    pub version: String,
}

/// Capabilities the UI adapts to
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetaResponse {
    pub ca_enabled: bool,
    pub ca_read_only: bool,
    pub unreported_hours: u32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/version", get(version))
        .route("/meta", get(meta))
}

/// GET /api/v1/version
async fn version() -> Envelope<VersionResponse> {
    Envelope::success(VersionResponse {
        version: crate::version(),
    })
}

/// GET /api/v1/meta
async fn meta(State(state): State<AppState>) -> Envelope<MetaResponse> {
    Envelope::success(MetaResponse {
        ca_enabled: state.certificates.is_some(),
        ca_read_only: state
            .certificates
            .as_ref()
            .is_some_and(|manager| manager.is_read_only()),
        unreported_hours: state.config.unreported_hours,
    })
}
