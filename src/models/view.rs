//! Predefined view models
//!
//! Views are named fact reports defined by the operator in the
//! configuration file. They are read once at startup and never change.

use serde::{Deserialize, Serialize};

/// A named report over a fixed set of facts
///
/// Read from snake_case configuration keys, rendered to the UI with
/// PascalCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub facts: Vec<ViewFact>,
    #[serde(default = "default_rows_per_page")]
    pub default_rows_per_page: u32,
}

/// One column of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "snake_case"))]
pub struct ViewFact {
    /// Column title
    pub name: String,
    /// Fact path; dotted paths address values nested in structured facts
    pub fact: String,
    /// Rendering hint for the UI
    #[serde(default)]
    pub renderer: String,
}

fn default_rows_per_page() -> u32 {
    10
}

impl ViewFact {
    /// Name of the top-level fact this column reads from (`os.family` -> `os`)
    pub fn root_fact(&self) -> &str {
        self.fact.split('.').next().unwrap_or(&self.fact)
    }
}

/// A view together with its computed rows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewResult {
    pub view: View,
    /// One object per certname mapping top-level fact name to value
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}
