//! PuppetDB command models

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Acknowledgement returned by the PuppetDB command endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub uuid: Uuid,
}

/// Payload of the `deactivate node` command (version 3)
#[derive(Debug, Clone, Serialize)]
pub struct DeactivateNodePayload {
    pub certname: String,
    #[serde(serialize_with = "serialize_utc")]
    pub producer_timestamp: DateTime<Utc>,
}

impl DeactivateNodePayload {
    pub fn now(certname: &str) -> Self {
        Self {
            certname: certname.to_string(),
            producer_timestamp: Utc::now(),
        }
    }
}

fn serialize_utc<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}
