//! Test application setup utilities
//!
//! Provides utilities for setting up test instances of the application
//! backed by the in-memory upstream doubles.

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use tower::ServiceExt;

use openvox_view::{
    api,
    config::{AppConfig, LoggingConfig, PuppetCaConfig, ServerConfig, UpstreamConfig},
    services::{CertificateAuthority, InventoryService},
    AppState,
};

use super::fixtures::{failed_nodes_query, inventory_view};
use super::mocks::{MockCa, MockInventory};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub puppetdb: Arc<MockInventory>,
    pub ca: Arc<MockCa>,
}

impl TestApp {
    /// Test application without a Puppet CA
    pub fn new() -> Self {
        Self::with_config(test_config(), MockCa::new())
    }

    /// Test application with certificate management enabled
    pub fn with_ca(ca: MockCa, deactivate_nodes: bool, read_only: bool) -> Self {
        let mut config = test_config();
        let mut ca_config = PuppetCaConfig::new("https://puppet:8140");
        ca_config.deactivate_nodes = deactivate_nodes;
        ca_config.read_only = read_only;
        config.puppet_ca = Some(ca_config);
        Self::with_config(config, ca)
    }

    /// Test application with custom configuration
    ///
    /// The CA double is only wired in when the configuration enables the CA.
    pub fn with_config(config: AppConfig, ca: MockCa) -> Self {
        let puppetdb = Arc::new(MockInventory::new());
        let ca = Arc::new(ca);

        let inventory: Arc<dyn InventoryService> = puppetdb.clone();
        let authority: Arc<dyn CertificateAuthority> = ca.clone();
        let state = AppState::new(config, inventory, Some(authority));

        Self {
            router: router(state.clone()),
            state,
            puppetdb,
            ca,
        }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request without a body
    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// API router as mounted by the server
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api::routes())
        .with_state(state)
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// The `Data` member of a success envelope
    pub fn data(&self) -> serde_json::Value {
        let json: serde_json::Value = self.json();
        assert!(json.get("Timestamp").is_some(), "missing Timestamp: {}", json);
        json["Data"].clone()
    }

    /// The `Error` member of an error envelope
    pub fn error(&self) -> String {
        let json: serde_json::Value = self.json();
        assert!(json.get("Data").is_none(), "error envelope carries Data: {}", json);
        json["Error"]
            .as_str()
            .expect("Error should be a string")
            .to_string()
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Forbidden (403)
    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::FORBIDDEN)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }

    /// Assert the response status is Internal Server Error (500)
    pub fn assert_server_error(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Assert the response status is Service Unavailable (503)
    pub fn assert_unavailable(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Configuration with one view and one predefined query
pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        puppetdb: UpstreamConfig::new("http://puppetdb:8080"),
        puppet_ca: None,
        logging: LoggingConfig::default(),
        unreported_hours: 2,
        queries: vec![failed_nodes_query()],
        views: vec![inventory_view()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new();
        assert!(app.state.certificates.is_none());
    }

    #[tokio::test]
    async fn test_app_with_ca() {
        let app = TestApp::with_ca(MockCa::new(), false, false);
        assert!(app.state.certificates.is_some());
    }
}
