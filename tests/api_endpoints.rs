//! Integration tests for PulseChain API endpoints

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use pulsechain::api::{build_api_router, Node};
use pulsechain::blockchain::{generate_block, Block, Ledger};
use pulsechain::config::{LedgerConfig, ServerConfig};
use pulsechain::service::LedgerService;
use serde_json::{json, Value};
use std::sync::Arc;

fn test_server() -> TestServer {
    test_server_with(&ServerConfig::default())
}

fn test_server_with(server: &ServerConfig) -> TestServer {
    let service = LedgerService::new(Arc::new(Ledger::new()), &LedgerConfig::default());
    let app = build_api_router(Arc::new(Node::new(service)), server);
    TestServer::new(app).expect("Failed to create test server")
}

fn chain_of(len: usize) -> Vec<Block> {
    let mut chain = vec![Block::genesis()];
    while chain.len() < len {
        let next = generate_block(chain.last().unwrap(), 60 + chain.len() as i64);
        chain.push(next);
    }
    chain
}

#[tokio::test]
async fn test_read_and_write_root() {
    let server = test_server();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    let chain: Vec<Block> = response.json();
    assert_eq!(chain, vec![Block::genesis()]);

    let response = server.post("/").json(&json!({ "BPM": 72 })).await;
    assert_eq!(response.status_code(), 201);
    let block: Value = response.json();
    assert_eq!(block["index"], 1);
    assert_eq!(block["bpm"], 72);
    assert_eq!(block["prev_hash"], Block::genesis().hash);
    assert_eq!(block["hash"].as_str().map(str::len), Some(64));

    // lowercase key is accepted too
    let response = server.post("/").json(&json!({ "bpm": 80 })).await;
    assert_eq!(response.status_code(), 201);

    let chain: Vec<Block> = server.get("/").await.json();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[2].bpm, 80);
    assert_eq!(chain[2].prev_hash, chain[1].hash);
}

#[tokio::test]
async fn test_bad_requests() {
    let server = test_server();

    let response = server
        .post("/")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server.post("/").json(&json!({ "BPM": "fast" })).await;
    assert_eq!(response.status_code(), 400);

    let response = server.post("/").json(&json!({ "BPM": 1000 })).await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("BPM"));

    let chain: Vec<Block> = server.get("/").await.json();
    assert_eq!(chain.len(), 1);
}

#[tokio::test]
async fn test_lookup_endpoints() {
    let server = test_server();
    for bpm in [61, 62, 63] {
        server.post("/").json(&json!({ "BPM": bpm })).await;
    }

    let response = server.get("/api/blockchain/height").await;
    assert_eq!(response.status_code(), 200);
    let height: u64 = response.json();
    assert_eq!(height, 4);

    let response = server.get("/api/blockchain/block/2").await;
    assert_eq!(response.status_code(), 200);
    let block: Block = response.json();
    assert_eq!(block.index, 2);
    assert_eq!(block.bpm, 62);

    let response = server.get("/api/blockchain/block/999").await;
    assert_eq!(response.status_code(), 404);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server
        .get("/api/blockchain/blocks")
        .add_query_param("page", 0)
        .add_query_param("limit", 2)
        .await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["total"], 4);
    assert_eq!(json["limit"], 2);
    let indices: Vec<u64> = json["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![3, 2]);

    let response = server
        .get("/api/blockchain/blocks")
        .add_query_param("limit", 1000)
        .await;
    let json: Value = response.json();
    assert_eq!(json["limit"], 100);
    assert_eq!(json["blocks"].as_array().unwrap().len(), 4);

    let response = server.get("/api/blockchain/validate").await;
    let json: Value = response.json();
    assert_eq!(json["valid"], true);
    assert_eq!(json["length"], 4);
}

#[tokio::test]
async fn test_replace_endpoint() {
    let server = test_server();
    server.post("/").json(&json!({ "BPM": 70 })).await;
    server.post("/").json(&json!({ "BPM": 71 })).await;

    // equal length keeps the current chain
    let response = server.post("/api/blockchain/replace").json(&chain_of(3)).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["replaced"], false);
    assert_eq!(json["length"], 3);

    // longer chain with a broken link is refused
    let mut broken = chain_of(5);
    broken[3].prev_hash = "00".repeat(32);
    broken[3].hash = broken[3].compute_hash();
    let json: Value = server.post("/api/blockchain/replace").json(&broken).await.json();
    assert_eq!(json["replaced"], false);
    assert_eq!(json["length"], 3);

    // longer valid chain wins
    let candidate = chain_of(5);
    let json: Value = server.post("/api/blockchain/replace").json(&candidate).await.json();
    assert_eq!(json["replaced"], true);
    assert_eq!(json["length"], 5);

    let chain: Vec<Block> = server.get("/").await.json();
    assert_eq!(chain, candidate);

    let response = server
        .post("/api/blockchain/replace")
        .json(&json!({ "blocks": [] }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_system_endpoints() {
    let server = test_server();

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());

    server.post("/").json(&json!({ "BPM": 90 })).await;
    server.post("/").json(&json!({ "BPM": -4 })).await;

    let response = server.get("/api/stats").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    // health, two posts; the stats request itself is recorded after it responds
    assert_eq!(json["total_requests"], 3);
    assert_eq!(json["successful_requests"], 2);
    assert_eq!(json["failed_requests"], 1);
    assert_eq!(json["blocks_created"], 1);
    assert_eq!(json["chains_replaced"], 0);
    assert_eq!(json["chain_length"], 2);
    assert!(json["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_oversized_replace_body_is_rejected() {
    let server = test_server_with(&ServerConfig {
        max_body_bytes: 1024,
        ..ServerConfig::default()
    });

    let candidate = chain_of(20);
    assert!(serde_json::to_vec(&candidate).unwrap().len() > 1024);

    let response = server.post("/api/blockchain/replace").json(&candidate).await;
    assert_eq!(response.status_code(), 413);

    // the current chain is untouched and small bodies still go through
    let chain: Vec<Block> = server.get("/").await.json();
    assert_eq!(chain.len(), 1);

    let response = server.post("/api/blockchain/replace").json(&chain_of(2)).await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["replaced"], true);
}

#[tokio::test]
async fn test_oversized_headers_are_rejected() {
    let server = test_server_with(&ServerConfig {
        max_header_bytes: 256,
        ..ServerConfig::default()
    });

    let response = server
        .get("/api/health")
        .add_header(
            HeaderName::from_static("x-padding"),
            HeaderValue::from_str(&"a".repeat(512)).unwrap(),
        )
        .await;
    assert_eq!(response.status_code(), 431);
    let json: Value = response.json();
    assert!(json["error"].is_string());

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
}
