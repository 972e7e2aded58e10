//! Ad-hoc query execution and history
//!
//! Queries typed into the UI are run verbatim against PuppetDB and timed.
//! When asked, the query and its outcome are appended to an in-memory
//! history shared by every request. The history lives for the process
//! lifetime and is never evicted.

use std::time::Instant;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{QueryHistoryEntry, QueryRequest, QueryResult};
use crate::services::puppetdb::InventoryService;
use crate::utils::error::AppResult;

/// Append-only log of executed queries
#[derive(Debug, Default)]
pub struct QueryHistory {
    entries: RwLock<Vec<QueryHistoryEntry>>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, entry: QueryHistoryEntry) {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        debug!("Query history now holds {} entries", entries.len());
    }

    /// Snapshot of every entry, oldest first
    pub async fn entries(&self) -> Vec<QueryHistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Run a raw query, recording it in the history when requested
///
/// Failed queries are recorded too; the upstream error is still returned.
pub async fn execute_query(
    inventory: &dyn InventoryService,
    history: &QueryHistory,
    request: QueryRequest,
) -> AppResult<QueryResult> {
    info!(query = %request.query, "Executing query");

    let started = Instant::now();
    let outcome = inventory.query(&request.query).await;
    let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    let (data, error) = match &outcome {
        Ok(rows) => (rows.clone(), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    let result = QueryResult {
        count: data.len(),
        data,
        success: error.is_none(),
        error,
        executed_on: Utc::now(),
        execution_time_in_milli: elapsed,
    };

    if request.save_in_history {
        history
            .record(QueryHistoryEntry {
                query: request,
                result: result.clone(),
            })
            .await;
    }

    outcome.map(|_| result)
}
