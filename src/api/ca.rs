//! Puppet CA management API endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, post},
    Json, Router,
};

use crate::api::envelope::Envelope;
use crate::models::{CertificateStatusQuery, CertificateStatusResponse};
use crate::services::CertificateManager;
use crate::utils::error::{AppError, AppResult};
use crate::AppState;

/// Create CA routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/status", post(query_certificates))
        .route("/status/{name}", delete(clean_certificate))
        .route("/status/{name}/sign", post(sign_certificate))
        .route("/status/{name}/revoke", post(revoke_certificate))
}

fn manager(state: &AppState) -> AppResult<&Arc<CertificateManager>> {
    state
        .certificates
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Puppet CA not configured".to_string()))
}

/// POST /api/v1/ca/status - List certificates
///
/// Request body:
/// ```json
/// { "states": ["requested", "signed"], "filter": "web" }
/// ```
async fn query_certificates(
    State(state): State<AppState>,
    payload: Result<Json<CertificateStatusQuery>, JsonRejection>,
) -> AppResult<Envelope<CertificateStatusResponse>> {
    let manager = manager(&state)?;
    let Json(query) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let certificate_statuses = manager.list(&query).await?;
    Ok(Envelope::success(CertificateStatusResponse {
        certificate_statuses,
    }))
}

/// POST /api/v1/ca/status/{name}/sign - Sign a certificate request
async fn sign_certificate(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Envelope<()>> {
    manager(&state)?.sign(&name).await?;
    Ok(Envelope::success(()))
}

/// POST /api/v1/ca/status/{name}/revoke - Revoke a certificate
///
/// Deactivates the node in PuppetDB afterwards when configured.
async fn revoke_certificate(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Envelope<()>> {
    manager(&state)?.revoke(&name).await?;
    Ok(Envelope::success(()))
}

/// DELETE /api/v1/ca/status/{name} - Clean a certificate
///
/// Deactivates the node in PuppetDB afterwards when configured.
async fn clean_certificate(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Envelope<()>> {
    manager(&state)?.clean(&name).await?;
    Ok(Envelope::success(()))
}
