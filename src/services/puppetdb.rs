//! PuppetDB client service
//!
//! Talks to the PuppetDB/OpenVoxDB v4 query API and the v1 command API.
//! Entity queries are POSTed with a [`PdbQuery`] body, ad-hoc PQL/AST strings
//! go to the root query endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::models::{CommandResponse, DeactivateNodePayload, EventCount, Fact, Node};
use crate::services::http_client::{build_client, read_json, transport_error};
use crate::services::query::PdbQuery;
use crate::utils::error::AppResult;

const SERVICE: &str = "PuppetDB";

/// Inventory operations the dashboard needs from PuppetDB
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Nodes matching the query
    async fn nodes(&self, query: &PdbQuery) -> AppResult<Vec<Node>>;

    /// Facts matching the query
    async fn facts(&self, query: &PdbQuery) -> AppResult<Vec<Fact>>;

    /// Event counts matching the query
    async fn event_counts(&self, query: &PdbQuery) -> AppResult<Vec<EventCount>>;

    /// Names of every fact known to PuppetDB
    async fn fact_names(&self) -> AppResult<Vec<String>>;

    /// Run a raw PQL or AST query string
    async fn query(&self, query: &str) -> AppResult<Vec<Value>>;

    /// Submit a `deactivate node` command
    async fn deactivate_node(&self, certname: &str) -> AppResult<CommandResponse>;
}

/// PuppetDB API client
#[derive(Clone)]
pub struct PuppetDbClient {
    client: Client,
    base_url: String,
}

/// PQL query request body
#[derive(Serialize)]
struct PqlQuery<'a> {
    query: &'a str,
}

impl PuppetDbClient {
    /// Create a new PuppetDB client with optional SSL/TLS configuration
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(path);
        debug!("PuppetDB: Sending POST request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, "POST", &url, e))?;

        read_json(SERVICE, response).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = self.url(path);
        debug!("PuppetDB: Sending GET request to {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, "GET", &url, e))?;

        read_json(SERVICE, response).await
    }
}

/// Query string of the `deactivate node` command submission
fn deactivate_command_query(certname: &str) -> String {
    format!(
        "command={}&version=3&certname={}",
        urlencoding::encode("deactivate node"),
        urlencoding::encode(certname)
    )
}

#[async_trait]
impl InventoryService for PuppetDbClient {
    async fn nodes(&self, query: &PdbQuery) -> AppResult<Vec<Node>> {
        self.post_json("pdb/query/v4/nodes", query).await
    }

    async fn facts(&self, query: &PdbQuery) -> AppResult<Vec<Fact>> {
        self.post_json("pdb/query/v4/facts", query).await
    }

    async fn event_counts(&self, query: &PdbQuery) -> AppResult<Vec<EventCount>> {
        self.post_json("pdb/query/v4/event-counts", query).await
    }

    async fn fact_names(&self) -> AppResult<Vec<String>> {
        self.get_json("pdb/query/v4/fact-names").await
    }

    async fn query(&self, query: &str) -> AppResult<Vec<Value>> {
        self.post_json("pdb/query/v4", &PqlQuery { query }).await
    }

    async fn deactivate_node(&self, certname: &str) -> AppResult<CommandResponse> {
        let path = format!("pdb/cmd/v1?{}", deactivate_command_query(certname));
        let response: CommandResponse = self
            .post_json(&path, &DeactivateNodePayload::now(certname))
            .await?;
        info!(certname = %certname, uuid = %response.uuid, "PuppetDB accepted deactivate node command");
        Ok(response)
    }
}
