//! End-to-end tests against HTTP mock servers
//!
//! The state is built from configuration exactly like the server does, so
//! these cover the real PuppetDB and Puppet CA clients behind the API.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use openvox_view::config::PuppetCaConfig;
use openvox_view::config::UpstreamConfig;
use openvox_view::AppState;

use crate::common::{router, test_config, TestResponse};

struct Upstreams {
    puppetdb: MockServer,
    ca: MockServer,
}

async fn app(deactivate_nodes: bool) -> (axum::Router, Upstreams) {
    let upstreams = Upstreams {
        puppetdb: MockServer::start().await,
        ca: MockServer::start().await,
    };

    let mut config = test_config();
    config.puppetdb = UpstreamConfig::new(upstreams.puppetdb.uri());
    let mut ca_config = PuppetCaConfig::new(upstreams.ca.uri());
    ca_config.deactivate_nodes = deactivate_nodes;
    config.puppet_ca = Some(ca_config);

    let state = AppState::from_config(config).expect("state should build");
    (router(state), upstreams)
}

async fn send(router: &axum::Router, method: &str, uri: &str) -> TestResponse {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(if method == "POST" && uri.ends_with("/ca/status") {
            Body::from("{}")
        } else {
            Body::empty()
        })
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

#[tokio::test]
async fn test_node_overview_through_puppetdb() {
    let (router, upstreams) = app(false).await;

    Mock::given(method("POST"))
        .and(path("/pdb/query/v4/event-counts"))
        .and(body_json(json!({
            "query": ["=", "latest_report?", true],
            "summarize_by": "certname"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "subject_type": "certname",
            "subject": {"title": "web1.example.com"},
            "failures": 1, "successes": 9, "noops": 0, "skips": 0
        }])))
        .expect(1)
        .mount(&upstreams.puppetdb)
        .await;

    Mock::given(method("POST"))
        .and(path("/pdb/query/v4/nodes"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"certname": "web1.example.com", "latest_report_status": "failed"},
            {"certname": "db1.example.com", "latest_report_status": "unchanged"}
        ])))
        .expect(1)
        .mount(&upstreams.puppetdb)
        .await;

    let response = send(&router, "GET", "/api/v1/view/node_overview").await;

    response.assert_ok();
    let nodes = response.data();
    assert_eq!(nodes[0]["events"]["failures"], 1);
    assert_eq!(nodes[1]["events"]["successes"], 0);
    assert_eq!(nodes[1]["unreported"], true);
}

#[tokio::test]
async fn test_puppetdb_error_status_maps_to_upstream_error() {
    let (router, upstreams) = app(false).await;

    Mock::given(method("GET"))
        .and(path("/pdb/query/v4/fact-names"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstreams.puppetdb)
        .await;

    let response = send(&router, "GET", "/api/v1/pdb/fact-names").await;

    response.assert_server_error();
    assert!(response.error().contains("500"));
}

#[tokio::test]
async fn test_certificate_listing_through_ca() {
    let (router, upstreams) = app(false).await;

    Mock::given(method("GET"))
        .and(path("/puppet-ca/v1/certificate_statuses/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "web1.example.com",
            "state": "signed",
            "fingerprint": "AA:BB",
            "fingerprints": {"SHA256": "AA:BB"},
            "dns_alt_names": ["DNS:web1"],
            "serial_number": 42,
            "not_before": "2024-01-10T12:00:00UTC",
            "not_after": "2029-01-09T12:00:00UTC"
        }])))
        .expect(1)
        .mount(&upstreams.ca)
        .await;

    let response = send(&router, "POST", "/api/v1/ca/status").await;

    response.assert_ok();
    let cert = &response.data()["certificate_statuses"][0];
    assert_eq!(cert["name"], "web1.example.com");
    assert_eq!(cert["state"], "signed");
    assert_eq!(cert["serial_number"], 42);
    assert_eq!(cert["not_before"], "2024-01-10T12:00:00Z");
}

#[tokio::test]
async fn test_revoke_cascades_deactivate_command() {
    let (router, upstreams) = app(true).await;

    Mock::given(method("PUT"))
        .and(path("/puppet-ca/v1/certificate_status/web1.example.com"))
        .and(body_json(json!({"desired_state": "revoked"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstreams.ca)
        .await;

    Mock::given(method("POST"))
        .and(path("/pdb/cmd/v1"))
        .and(query_param("command", "deactivate node"))
        .and(query_param("version", "3"))
        .and(query_param("certname", "web1.example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"uuid": "0b9e4b4c-2a4f-4ad5-9c63-8f1b3a0e4d10"})),
        )
        .expect(1)
        .mount(&upstreams.puppetdb)
        .await;

    let response = send(
        &router,
        "POST",
        "/api/v1/ca/status/web1.example.com/revoke",
    )
    .await;

    response.assert_ok();
    assert_eq!(response.data(), json!(null));
}

#[tokio::test]
async fn test_clean_signed_certificate_through_ca() {
    let (router, upstreams) = app(false).await;

    Mock::given(method("GET"))
        .and(path("/puppet-ca/v1/certificate_status/web1.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "web1.example.com",
            "state": "signed",
            "fingerprint": "AA:BB"
        })))
        .mount(&upstreams.ca)
        .await;

    Mock::given(method("PUT"))
        .and(path("/puppet-ca/v1/clean"))
        .and(body_json(json!({"certnames": ["web1.example.com"]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstreams.ca)
        .await;

    let response = send(&router, "DELETE", "/api/v1/ca/status/web1.example.com").await;

    response.assert_ok();
}

#[tokio::test]
async fn test_ca_rejection_is_reported() {
    let (router, upstreams) = app(true).await;

    Mock::given(method("PUT"))
        .and(path("/puppet-ca/v1/certificate_status/agent1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already signed"))
        .mount(&upstreams.ca)
        .await;

    Mock::given(method("POST"))
        .and(path("/pdb/cmd/v1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstreams.puppetdb)
        .await;

    let response = send(&router, "POST", "/api/v1/ca/status/agent1/sign").await;

    response.assert_server_error();
    assert!(response.error().contains("409"));
}
