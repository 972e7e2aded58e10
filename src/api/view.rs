//! View API endpoints
//!
//! The node overview and the operator-defined fact views.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use axum_extra::extract::{Query, QueryRejection};

use crate::api::envelope::Envelope;
use crate::models::{Node, View, ViewResult};
use crate::services::{views, NodeOverviewFilter};
use crate::utils::error::{AppError, AppResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/node_overview", get(node_overview))
        .route("/predefined", get(list_views))
        .route("/predefined/{name}", get(view_result))
        .route("/predefined/{name}/meta", get(view_meta))
}

/// GET /api/v1/view/node_overview?environment=&status=&status=
///
/// Nodes with their latest-report event counts and unreported flag.
async fn node_overview(
    State(state): State<AppState>,
    query: Result<Query<NodeOverviewFilter>, QueryRejection>,
) -> AppResult<Envelope<Vec<Node>>> {
    let Query(filter) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let nodes =
        views::node_overview(state.puppetdb.as_ref(), &filter, state.config.unreported_hours)
            .await?;
    Ok(Envelope::success(nodes))
}

/// GET /api/v1/view/predefined
async fn list_views(State(state): State<AppState>) -> Envelope<Vec<View>> {
    Envelope::success(state.config.views.clone())
}

/// GET /api/v1/view/predefined/{name}
///
/// The view together with one row of facts per node.
async fn view_result(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Envelope<ViewResult>> {
    let view = find_view(&state, &name)?;
    let result = views::render_view(state.puppetdb.as_ref(), view).await?;
    Ok(Envelope::success(result))
}

/// GET /api/v1/view/predefined/{name}/meta
async fn view_meta(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Envelope<View>> {
    Ok(Envelope::success(find_view(&state, &name)?.clone()))
}

fn find_view<'a>(state: &'a AppState, name: &str) -> AppResult<&'a View> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("no view name".to_string()));
    }
    state
        .config
        .view(name)
        .ok_or_else(|| AppError::NotFound(format!("view {} does not exist", name)))
}
