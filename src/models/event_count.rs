//! Event count data model

use serde::{Deserialize, Serialize};

/// Aggregated resource event outcomes for one subject, as returned by the
/// PuppetDB `event-counts` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCount {
    #[serde(default)]
    pub failures: u64,
    #[serde(default)]
    pub skips: u64,
    #[serde(default)]
    pub successes: u64,
    #[serde(default)]
    pub noops: u64,
    /// What the counts are summarized by (e.g. "certname")
    #[serde(default)]
    pub subject_type: String,
    #[serde(default)]
    pub subject: EventSubject,
}

/// Subject of an event count; `title` holds the certname when summarized by
/// certname
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubject {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
}
