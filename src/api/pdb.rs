//! PuppetDB passthrough API endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::envelope::Envelope;
use crate::models::{EventCount, PredefinedQuery, QueryHistoryEntry, QueryRequest, QueryResult};
use crate::services::{query_history, PdbQuery};
use crate::utils::error::{AppError, AppResult};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(execute_query))
        .route("/query/history", get(get_query_history))
        .route("/query/predefined", get(predefined_queries))
        .route("/fact-names", get(fact_names))
        .route("/event-counts", post(event_counts))
}

/// Turn a JSON body rejection into the standard error envelope
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// POST /api/v1/pdb/query
///
/// Run a raw PQL query, optionally keeping it in the history.
///
/// Request body:
/// ```json
/// { "query": "nodes { latest_report_status = 'failed' }", "saveInHistory": true }
/// ```
async fn execute_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Envelope<QueryResult>> {
    let request = body(payload)?;
    let result =
        query_history::execute_query(state.puppetdb.as_ref(), &state.query_history, request)
            .await?;
    Ok(Envelope::success(result))
}

/// GET /api/v1/pdb/query/history
async fn get_query_history(State(state): State<AppState>) -> Envelope<Vec<QueryHistoryEntry>> {
    Envelope::success(state.query_history.entries().await)
}

/// GET /api/v1/pdb/query/predefined
async fn predefined_queries(State(state): State<AppState>) -> Envelope<Vec<PredefinedQuery>> {
    Envelope::success(state.config.queries.clone())
}

/// GET /api/v1/pdb/fact-names
async fn fact_names(State(state): State<AppState>) -> AppResult<Envelope<Vec<String>>> {
    Ok(Envelope::success(state.puppetdb.fact_names().await?))
}

/// POST /api/v1/pdb/event-counts
///
/// Event counts for a caller-supplied query.
///
/// Request body:
/// ```json
/// { "query": ["=", "latest_report?", true], "summarize_by": "certname" }
/// ```
async fn event_counts(
    State(state): State<AppState>,
    payload: Result<Json<PdbQuery>, JsonRejection>,
) -> AppResult<Envelope<Vec<EventCount>>> {
    let query = body(payload)?;
    Ok(Envelope::success(state.puppetdb.event_counts(&query).await?))
}
