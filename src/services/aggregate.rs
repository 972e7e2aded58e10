//! Result aggregation
//!
//! Joins and reshapes PuppetDB result sets into what the UI renders, and
//! normalizes certificate state filters before they reach the CA.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use crate::models::{CertificateState, EventCount, Fact, Node};

/// Attach to every node the event counts whose subject title is its certname
///
/// The first matching count wins. Nodes without a match keep zero-valued
/// counts.
pub fn join_event_counts(nodes: &mut [Node], counts: &[EventCount]) {
    let mut by_certname: HashMap<&str, &EventCount> = HashMap::with_capacity(counts.len());
    for count in counts {
        by_certname.entry(count.subject.title.as_str()).or_insert(count);
    }

    for node in nodes.iter_mut() {
        node.events = by_certname
            .get(node.certname.as_str())
            .map(|count| (*count).clone())
            .unwrap_or_default();
    }
}

/// Whether a node missed its reporting window
///
/// A node without any report is always unreported. With a window of zero
/// hours only a missing report counts.
pub fn is_unreported(node: &Node, now: DateTime<Utc>, unreported_hours: u32) -> bool {
    match node.report_timestamp {
        None => true,
        Some(_) if unreported_hours == 0 => false,
        Some(reported) => reported < now - Duration::hours(i64::from(unreported_hours)),
    }
}

/// Set the `unreported` flag of every node
pub fn mark_unreported(nodes: &mut [Node], now: DateTime<Utc>, unreported_hours: u32) {
    for node in nodes.iter_mut() {
        node.unreported = is_unreported(node, now, unreported_hours);
    }
}

/// Group facts by certname into one `fact name -> value` object per node
///
/// Row order is unspecified. When a node reports the same fact twice the
/// last value wins.
pub fn flatten_facts(facts: Vec<Fact>) -> Vec<Map<String, Value>> {
    let mut rows: HashMap<String, Map<String, Value>> = HashMap::new();
    for fact in facts {
        rows.entry(fact.certname)
            .or_default()
            .insert(fact.name, fact.value);
    }
    rows.into_values().collect()
}

/// Which certificates a listing asks the CA for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateFilter {
    /// Every state; served by one unfiltered CA call
    All,
    /// The given states, unique and in first-requested order
    States(Vec<CertificateState>),
}

impl CertificateFilter {
    /// Normalize the requested states
    ///
    /// Absent states, or every known state, means no filtering at all. An
    /// explicitly empty list selects nothing.
    pub fn from_states(states: Option<&[CertificateState]>) -> Self {
        let Some(states) = states else {
            return CertificateFilter::All;
        };

        let unique = unique_states(states);
        if unique.len() == CertificateState::ALL.len() {
            CertificateFilter::All
        } else {
            CertificateFilter::States(unique)
        }
    }
}

/// Drop repeated states, keeping the first occurrence of each
pub fn unique_states(states: &[CertificateState]) -> Vec<CertificateState> {
    let mut unique = Vec::with_capacity(CertificateState::ALL.len());
    for state in states {
        if !unique.contains(state) {
            unique.push(*state);
        }
    }
    unique
}
