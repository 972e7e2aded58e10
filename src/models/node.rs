//! Node data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EventCount;

/// A node as returned by the PuppetDB `nodes` endpoint, enriched with the
/// event counts of its latest report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Certificate name (unique identifier)
    pub certname: String,

    /// When the node was deactivated
    #[serde(default)]
    pub deactivated: Option<DateTime<Utc>>,

    /// When the node expired
    #[serde(default)]
    pub expired: Option<DateTime<Utc>>,

    #[serde(default)]
    pub catalog_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub facts_timestamp: Option<DateTime<Utc>>,

    /// Timestamp of the most recent report
    #[serde(default)]
    pub report_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub catalog_environment: Option<String>,

    #[serde(default)]
    pub facts_environment: Option<String>,

    #[serde(default)]
    pub report_environment: Option<String>,

    /// Latest report status (changed, unchanged, failed)
    #[serde(default)]
    pub latest_report_status: Option<String>,

    #[serde(default)]
    pub latest_report_noop: Option<bool>,

    #[serde(default)]
    pub latest_report_noop_pending: Option<bool>,

    #[serde(default)]
    pub latest_report_hash: Option<String>,

    #[serde(default)]
    pub latest_report_job_id: Option<String>,

    #[serde(default)]
    pub cached_catalog_status: Option<String>,

    #[serde(default)]
    pub latest_report_corrective_change: Option<bool>,

    /// Event counts of the latest report; all zero when none were found
    #[serde(default)]
    pub events: EventCount,

    /// Whether the node has not reported within the configured window
    #[serde(default)]
    pub unreported: bool,
}
