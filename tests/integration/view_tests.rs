//! Node overview and predefined view tests

use serde_json::json;

use crate::common::{event_count, fact, node, silent_node, MockError, TestApp};

#[tokio::test]
async fn test_node_overview_unfiltered() {
    let app = TestApp::new();
    app.puppetdb.add_nodes(vec![
        node("web1", "changed", 1),
        node("db1", "failed", 5),
        silent_node("new1"),
    ]);
    app.puppetdb
        .add_event_counts(vec![event_count("web1", 0, 12), event_count("db1", 3, 1)]);

    let response = app.get("/api/v1/view/node_overview").await;

    response.assert_ok();
    let nodes = response.data();
    assert_eq!(nodes.as_array().unwrap().len(), 3);

    assert_eq!(nodes[0]["certname"], "web1");
    assert_eq!(nodes[0]["events"]["successes"], 12);
    assert_eq!(nodes[0]["unreported"], false);

    assert_eq!(nodes[1]["events"]["failures"], 3);
    assert_eq!(nodes[1]["unreported"], true);

    assert_eq!(nodes[2]["events"]["failures"], 0);
    assert_eq!(nodes[2]["unreported"], true);

    assert_eq!(app.puppetdb.received("nodes"), vec![json!({})]);
    assert_eq!(
        app.puppetdb.received("event-counts"),
        vec![json!({"query": ["=", "latest_report?", true], "summarize_by": "certname"})]
    );
}

#[tokio::test]
async fn test_node_overview_environment_and_statuses() {
    let app = TestApp::new();

    app.get("/api/v1/view/node_overview?environment=production&status=failed&status=changed")
        .await
        .assert_ok();

    assert_eq!(
        app.puppetdb.received("nodes"),
        vec![json!({"query": [
            "and",
            ["=", "catalog_environment", "production"],
            ["or",
                ["=", "latest_report_status", "failed"],
                ["=", "latest_report_status", "changed"]]
        ]})]
    );
}

#[tokio::test]
async fn test_node_overview_rejects_repeated_environment() {
    let app = TestApp::new();

    let response = app
        .get("/api/v1/view/node_overview?environment=production&environment=staging")
        .await;

    response.assert_bad_request();
    assert!(!response.error().is_empty());
    assert!(response.json::<serde_json::Value>()["Timestamp"].is_string());
    assert_eq!(app.puppetdb.call_count(), 0);
}

#[tokio::test]
async fn test_node_overview_wildcard_environment() {
    let app = TestApp::new();

    app.get("/api/v1/view/node_overview?environment=*")
        .await
        .assert_ok();

    assert_eq!(app.puppetdb.received("nodes"), vec![json!({})]);
}

#[tokio::test]
async fn test_node_overview_upstream_failure() {
    let app = TestApp::new();
    app.puppetdb.set_error_mode(MockError::Status(503));

    let response = app.get("/api/v1/view/node_overview").await;

    response.assert_server_error();
    assert!(response.error().contains("503"));
    assert!(app.puppetdb.received("nodes").is_empty());
}

#[tokio::test]
async fn test_list_predefined_views() {
    let app = TestApp::new();
    let response = app.get("/api/v1/view/predefined").await;

    response.assert_ok();
    let views = response.data();
    assert_eq!(views[0]["Name"], "inventory");
    assert_eq!(views[0]["DefaultRowsPerPage"], 25);
    assert_eq!(views[0]["Facts"][0]["Fact"], "os.family");
}

#[tokio::test]
async fn test_predefined_view_rows() {
    let app = TestApp::new();
    app.puppetdb.add_facts(vec![
        fact("web1", "os", json!({"family": "RedHat"})),
        fact("web1", "kernelrelease", json!("5.14.0")),
        fact("db1", "os", json!({"family": "Debian"})),
    ]);

    let response = app.get("/api/v1/view/predefined/inventory").await;

    response.assert_ok();
    let data = response.data();
    assert_eq!(data["View"]["Name"], "inventory");

    // Row order is unspecified
    let rows = data["Data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.contains(&json!({"os": {"family": "RedHat"}, "kernelrelease": "5.14.0"})));
    assert!(rows.contains(&json!({"os": {"family": "Debian"}})));
    assert_eq!(
        app.puppetdb.received("facts"),
        vec![json!({"query": ["and", ["or", ["=", "name", "os"], ["=", "name", "kernelrelease"]]]})]
    );
}

#[tokio::test]
async fn test_predefined_view_meta() {
    let app = TestApp::new();
    let response = app.get("/api/v1/view/predefined/inventory/meta").await;

    response.assert_ok();
    assert_eq!(response.data()["Facts"][1]["Name"], "Kernel");
    assert_eq!(app.puppetdb.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_view() {
    let app = TestApp::new();

    let response = app.get("/api/v1/view/predefined/nope").await;
    response.assert_not_found();
    assert!(response.error().contains("does not exist"));

    app.get("/api/v1/view/predefined/nope/meta")
        .await
        .assert_not_found();
    assert_eq!(app.puppetdb.call_count(), 0);
}
