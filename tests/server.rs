//! HTTP contract tests: a real server on a free port, queried with reqwest.

mod common;

use compound_finder::catalog::load_catalog;
use compound_finder::config::load_config;
use compound_finder::server::serve_catalog;
use serde_json::{json, Value};
use std::sync::Arc;

use common::setup_test_env;

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start_server() -> (tempfile::TempDir, u16, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let (tmp, config_path) = setup_test_env(&format!("127.0.0.1:{}", port));
    let cfg = load_config(&config_path).unwrap();
    let catalog = Arc::new(load_catalog(&cfg));

    let bind = format!("127.0.0.1:{}", port);
    let handle = tokio::spawn(async move {
        serve_catalog(&bind, catalog).await.ok();
    });
    wait_for_server(port).await;
    (tmp, port, handle)
}

async fn get(port: u16, path_and_query: &str) -> (u16, Value) {
    let url = format!("http://127.0.0.1:{}{}", port, path_and_query);
    let resp = reqwest::get(&url).await.unwrap();
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn test_search_endpoints() {
    let (_tmp, port, handle) = start_server().await;

    let (status, body) = get(port, "/search?query=H2SO4%20%20&type=compound").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "query": "h2so4", "files": ["SW2_ALL_COMPOUNDS.xlsx"] }));

    let (status, body) = get(port, "/api/search?query=Acids&type=category").await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "query": "acids",
            "files": ["SW1_ALL_Compounds.xlsx", "SW2_ALL_COMPOUNDS.xlsx"]
        })
    );

    let (status, body) = get(port, "/search?query=C999XYZ&type=compound").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "query": "c999xyz", "files": [] }));

    let (status, body) = get(port, "/search?query=nothing&type=category").await;
    assert_eq!(status, 200);
    assert_eq!(body["files"], json!([]));

    handle.abort();
}

#[tokio::test]
async fn test_invalid_type_is_bad_request() {
    let (_tmp, port, handle) = start_server().await;

    for path in [
        "/search?query=x&type=bogus",
        "/search?query=hcl",
        "/api/search?type=Compound&query=hcl",
        "/search?query=hcl&type=compound&type=category",
    ] {
        let (status, body) = get(port, path).await;
        assert_eq!(status, 400, "path {}", path);
        assert_eq!(body, json!({ "error": "Invalid search type" }));
    }

    handle.abort();
}

#[tokio::test]
async fn test_repeated_query_uses_first_value() {
    let (_tmp, port, handle) = start_server().await;

    let (status, body) = get(port, "/search?query=HCl&query=b&type=compound").await;
    assert_eq!(status, 200);
    assert_eq!(body["query"], "hcl");
    assert_eq!(
        body["files"],
        json!(["SW1_ALL_Compounds.xlsx", "SW2_ALL_COMPOUNDS.xlsx"])
    );

    handle.abort();
}

#[tokio::test]
async fn test_missing_query_is_empty_key() {
    let (_tmp, port, handle) = start_server().await;

    let (status, body) = get(port, "/search?type=compound").await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "query": "", "files": [] }));

    handle.abort();
}

#[tokio::test]
async fn test_cors_and_health() {
    let (_tmp, port, handle) = start_server().await;

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://127.0.0.1:{}/search?query=hcl&type=compound", port))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let (status, body) = get(port, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    handle.abort();
}
