//! Ad-hoc query models
//!
//! Requests and results of raw PQL queries typed into the UI, plus the
//! operator-defined predefined queries offered as starting points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw query request from the UI
///
/// The UI sends both `{"Query": ...}` and `{"query": ..., "saveInHistory": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase"))]
pub struct QueryRequest {
    #[serde(alias = "Query")]
    pub query: String,
    #[serde(default, alias = "saveInHistory", alias = "SaveInHistory")]
    pub save_in_history: bool,
}

/// Outcome of one executed query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResult {
    pub data: Vec<serde_json::Value>,
    pub error: Option<String>,
    pub success: bool,
    pub executed_on: DateTime<Utc>,
    pub execution_time_in_milli: i64,
    pub count: usize,
}

/// A query together with its result, as kept in the query history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryHistoryEntry {
    pub query: QueryRequest,
    pub result: QueryResult,
}

/// Query offered by the operator in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct PredefinedQuery {
    #[serde(default)]
    pub description: String,
    pub query: String,
}
