//! Certificate models for Puppet CA management

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Lifecycle state of a certificate as reported by the Puppet CA
///
/// There is no ordering between states; which transitions are allowed is
/// decided by the CA itself, and `clean` picks its wire call per state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateState {
    /// Certificate request is pending signature
    Requested,
    /// Certificate is signed and valid
    Signed,
    /// Certificate has been revoked
    Revoked,
}

impl CertificateState {
    /// Every known state, in declaration order
    pub const ALL: [CertificateState; 3] = [
        CertificateState::Requested,
        CertificateState::Signed,
        CertificateState::Revoked,
    ];

    /// Wire name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateState::Requested => "requested",
            CertificateState::Signed => "signed",
            CertificateState::Revoked => "revoked",
        }
    }
}

/// Rejected certificate state string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0:?} is not a valid certificate state")]
pub struct InvalidCertificateState(pub String);

impl FromStr for CertificateState {
    type Err = InvalidCertificateState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "requested" => Ok(CertificateState::Requested),
            "signed" => Ok(CertificateState::Signed),
            "revoked" => Ok(CertificateState::Revoked),
            _ => Err(InvalidCertificateState(normalized)),
        }
    }
}

impl fmt::Display for CertificateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CertificateState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CertificateState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One certificate entry from the Puppet CA inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateStatus {
    /// Subject name of the certificate (the node certname)
    pub name: String,
    /// Current lifecycle state
    pub state: CertificateState,
    /// Default fingerprint (SHA256)
    #[serde(default)]
    pub fingerprint: String,
    /// Fingerprints keyed by digest algorithm
    #[serde(default)]
    pub fingerprints: HashMap<String, String>,
    /// DNS alternative names
    #[serde(default)]
    pub dns_alt_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_alt_names: Option<Vec<String>>,
    /// Serial number; may exceed 64 bits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_extensions: Option<HashMap<String, String>>,
    /// Not valid before
    #[serde(default, with = "ca_time", skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    /// Not valid after
    #[serde(default, with = "ca_time", skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
}

/// Certificate listing filter supplied by the UI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateStatusQuery {
    /// States to include; absent means every state
    #[serde(default)]
    pub states: Option<Vec<CertificateState>>,
    /// Case-sensitive text matched against name, fingerprint and DNS alt names
    #[serde(default)]
    pub filter: Option<String>,
}

impl CertificateStatus {
    /// Whether the free-text filter matches this certificate
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.name.contains(filter)
            || self.fingerprint.contains(filter)
            || self.dns_alt_names.iter().any(|alt| alt.contains(filter))
    }
}

/// Response body of the certificate listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateStatusResponse {
    pub certificate_statuses: Vec<CertificateStatus>,
}

/// Timestamps of the Puppet CA
///
/// The CA writes `YYYY-MM-DDTHH:MM:SS` followed directly by a zone
/// abbreviation (`2024-01-10T12:00:00UTC`). Abbreviations carry no offset and
/// are read as UTC. Output is always RFC3339.
pub mod ca_time {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const LOCAL_PART_LEN: usize = 19;
    const LOCAL_PART_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Parse a CA timestamp, falling back to RFC3339 when an offset is present
    pub fn parse(s: &str) -> Result<DateTime<Utc>, String> {
        let s = s.trim();
        if let (Some(local), Some(zone)) = (s.get(..LOCAL_PART_LEN), s.get(LOCAL_PART_LEN..)) {
            if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) {
                return NaiveDateTime::parse_from_str(local, LOCAL_PART_FORMAT)
                    .map(|naive| naive.and_utc())
                    .map_err(|e| format!("invalid CA timestamp {:?}: {}", s, e));
            }
        }

        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("invalid CA timestamp {:?}: {}", s, e))
    }

    /// Render a timestamp the way the CA writes it
    pub fn format_external(dt: &DateTime<Utc>) -> String {
        format!("{}UTC", dt.format(LOCAL_PART_FORMAT))
    }

    /// Render a timestamp for API consumers
    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
