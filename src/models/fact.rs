//! Fact data model

use serde::{Deserialize, Serialize};

/// One fact of one node, as returned by the PuppetDB `facts` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Certificate name of the node
    pub certname: String,

    /// Top-level fact name
    pub name: String,

    /// Environment
    #[serde(default)]
    pub environment: Option<String>,

    /// Fact value; structured facts keep their full JSON shape
    pub value: serde_json::Value,
}
