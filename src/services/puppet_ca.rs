//! Puppet CA client for certificate management
//!
//! Wraps the `puppet-ca/v1` certificate status API. The CA is authoritative
//! for every state transition; this client only forwards requests.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::models::{CertificateState, CertificateStatus};
use crate::services::http_client::{
    build_client, expect_success, read_json, status_error, transport_error,
};
use crate::utils::error::AppResult;

const SERVICE: &str = "Puppet CA";

/// Certificate operations offered by the Puppet CA
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// Every certificate, or only those in `state`
    async fn list_certificates(
        &self,
        state: Option<CertificateState>,
    ) -> AppResult<Vec<CertificateStatus>>;

    /// One certificate; `None` when the CA does not know the name
    async fn get_certificate(&self, name: &str) -> AppResult<Option<CertificateStatus>>;

    /// Ask the CA to move a certificate to `desired_state`
    async fn set_desired_state(
        &self,
        name: &str,
        desired_state: CertificateState,
    ) -> AppResult<()>;

    /// Revoke and delete a signed certificate in one call
    async fn clean_certificate(&self, name: &str) -> AppResult<()>;

    /// Delete a certificate or request outright
    async fn delete_certificate(&self, name: &str) -> AppResult<()>;
}

/// Puppet CA API client
#[derive(Clone)]
pub struct PuppetCaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct DesiredState {
    desired_state: CertificateState,
}

#[derive(Serialize)]
struct CleanRequest<'a> {
    certnames: [&'a str; 1],
}

impl PuppetCaClient {
    /// Create a new Puppet CA client from configuration
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn status_url(&self, name: &str) -> String {
        format!(
            "{}/puppet-ca/v1/certificate_status/{}",
            self.base_url,
            urlencoding::encode(name)
        )
    }

    async fn send(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> AppResult<reqwest::Response> {
        debug!("Puppet CA: Sending {} request to {}", method, url);
        request
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, method, url, e))
    }
}

#[async_trait]
impl CertificateAuthority for PuppetCaClient {
    async fn list_certificates(
        &self,
        state: Option<CertificateState>,
    ) -> AppResult<Vec<CertificateStatus>> {
        let mut url = format!("{}/puppet-ca/v1/certificate_statuses/all", self.base_url);
        if let Some(state) = state {
            url.push_str("?state=");
            url.push_str(state.as_str());
        }

        let response = self.send("GET", self.client.get(&url), &url).await?;
        read_json(SERVICE, response).await
    }

    async fn get_certificate(&self, name: &str) -> AppResult<Option<CertificateStatus>> {
        let url = self.status_url(name);
        let response = self.send("GET", self.client.get(&url), &url).await?;

        match response.status() {
            StatusCode::OK => read_json(SERVICE, response).await.map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(status_error(SERVICE, response).await),
        }
    }

    async fn set_desired_state(
        &self,
        name: &str,
        desired_state: CertificateState,
    ) -> AppResult<()> {
        let url = self.status_url(name);
        let request = self.client.put(&url).json(&DesiredState { desired_state });
        let response = self.send("PUT", request, &url).await?;
        expect_success(SERVICE, response).await
    }

    async fn clean_certificate(&self, name: &str) -> AppResult<()> {
        let url = format!("{}/puppet-ca/v1/clean", self.base_url);
        let request = self.client.put(&url).json(&CleanRequest { certnames: [name] });
        let response = self.send("PUT", request, &url).await?;
        expect_success(SERVICE, response).await
    }

    async fn delete_certificate(&self, name: &str) -> AppResult<()> {
        let url = self.status_url(name);
        let response = self.send("DELETE", self.client.delete(&url), &url).await?;
        expect_success(SERVICE, response).await
    }
}
