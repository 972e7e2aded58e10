//! Test fixtures for common test data
//!
//! Fixtures provide pre-defined test data that can be used across multiple tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use openvox_view::models::{
    CertificateState, CertificateStatus, EventCount, EventSubject, Fact, Node, PredefinedQuery,
    View, ViewFact,
};

/// A node with a latest report status, reporting `hours_ago` hours ago
pub fn node(certname: &str, status: &str, hours_ago: i64) -> Node {
    Node {
        certname: certname.to_string(),
        report_timestamp: Some(Utc::now() - Duration::hours(hours_ago)),
        report_environment: Some("production".to_string()),
        latest_report_status: Some(status.to_string()),
        ..Default::default()
    }
}

/// A node that never reported
pub fn silent_node(certname: &str) -> Node {
    Node {
        certname: certname.to_string(),
        ..Default::default()
    }
}

/// Event counts summarized by certname
pub fn event_count(certname: &str, failures: u64, successes: u64) -> EventCount {
    EventCount {
        failures,
        successes,
        subject_type: "certname".to_string(),
        subject: EventSubject {
            title: certname.to_string(),
            subject_type: None,
        },
        ..Default::default()
    }
}

pub fn fact(certname: &str, name: &str, value: Value) -> Fact {
    Fact {
        certname: certname.to_string(),
        name: name.to_string(),
        environment: Some("production".to_string()),
        value,
    }
}

pub fn certificate(name: &str, state: CertificateState) -> CertificateStatus {
    let not_before: DateTime<Utc> = Utc::now() - Duration::days(30);
    CertificateStatus {
        name: name.to_string(),
        state,
        fingerprint: format!("AA:BB:{}", name.len()),
        fingerprints: HashMap::from([("SHA256".to_string(), format!("AA:BB:{}", name.len()))]),
        dns_alt_names: vec![format!("DNS:{}", name), "DNS:puppet".to_string()],
        subject_alt_names: None,
        serial_number: Some(serde_json::Number::from(name.len())),
        authorization_extensions: None,
        not_before: Some(not_before),
        not_after: Some(not_before + Duration::days(365)),
    }
}

/// The inventory view used across tests
pub fn inventory_view() -> View {
    View {
        name: "inventory".to_string(),
        facts: vec![
            ViewFact {
                name: "OS".to_string(),
                fact: "os.family".to_string(),
                renderer: "text".to_string(),
            },
            ViewFact {
                name: "Kernel".to_string(),
                fact: "kernelrelease".to_string(),
                renderer: String::new(),
            },
        ],
        default_rows_per_page: 25,
    }
}

pub fn failed_nodes_query() -> PredefinedQuery {
    PredefinedQuery {
        description: "Failed nodes".to_string(),
        query: "nodes { latest_report_status = 'failed' }".to_string(),
    }
}
