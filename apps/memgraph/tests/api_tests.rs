//! Integration tests for the memgraph HTTP API.
//!
//! Uses axum-test to drive the router without binding a socket. Every
//! server gets its own backing file in a temp dir.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use memgraph::api::{
    ApiResponse, AppState, HealthResponse, StatusResponse, ToolCallData, ToolInfo, WriteGuard,
    create_router,
};
use memgraph_core::{Dispatcher, GraphStore, LoadPolicy, MutationEngine};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn dispatcher_in(dir: &TempDir) -> Dispatcher {
    let store = GraphStore::open(dir.path().join("memory.jsonl"), LoadPolicy::Reset).unwrap();
    Dispatcher::new(MutationEngine::new(Arc::new(store)), 200)
}

/// Server over a fresh graph file. Keep the `TempDir` alive for the test.
fn create_guarded_server(guard: WriteGuard) -> (TestServer, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(dispatcher_in(&dir)).with_guard(guard);
    (TestServer::new(create_router(state)).unwrap(), dir)
}

fn create_test_server() -> (TestServer, TempDir) {
    create_guarded_server(WriteGuard::default())
}

async fn call(server: &TestServer, tool: &str, args: Value) -> ToolCallData {
    let response = server
        .post("/tool/call")
        .json(&json!({"tool_name": tool, "tool_args": args}))
        .await;
    response.assert_status_ok();
    let body: ApiResponse<ToolCallData> = response.json();
    assert!(body.success);
    body.data.unwrap()
}

fn payload(data: &ToolCallData) -> Value {
    serde_json::from_str(&data.content[0].text).unwrap()
}

async fn seed(server: &TestServer) {
    call(
        server,
        "create_entities",
        json!({"entities": [
            {"name": "Ada", "entityType": "person", "observations": ["writes Rust"]},
            {"name": "Grace", "entityType": "person", "observations": ["wrote COBOL"]},
        ]}),
    )
    .await;
    call(
        server,
        "create_relations",
        json!({"relations": [{"from": "Ada", "to": "Grace", "relationType": "admires"}]}),
    )
    .await;
}

// =============================================================================
// HEALTH / STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _dir) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_empty_graph() {
    let (server, _dir) = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let body: ApiResponse<StatusResponse> = response.json();
    let status = body.data.unwrap();
    assert_eq!(status.entity_count, 0);
    assert_eq!(status.relation_count, 0);
    assert!(status.memory_path.ends_with("memory.jsonl"));
}

#[tokio::test]
async fn test_status_counts_after_seed() {
    let (server, _dir) = create_test_server();
    seed(&server).await;

    let body: ApiResponse<StatusResponse> = server.get("/status").await.json();
    let status = body.data.unwrap();
    assert_eq!(status.entity_count, 2);
    assert_eq!(status.relation_count, 1);
    assert_eq!(status.observation_count, 2);
}

// =============================================================================
// TOOL CATALOGUE TESTS
// =============================================================================

#[tokio::test]
async fn test_tools_lists_all_nine() {
    let (server, _dir) = create_test_server();

    let response = server.get("/tools").await;

    response.assert_status_ok();
    let body: ApiResponse<Vec<ToolInfo>> = response.json();
    let tools = body.data.unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "create_entities",
            "create_relations",
            "add_observations",
            "delete_entities",
            "delete_observations",
            "delete_relations",
            "read_graph",
            "search_nodes",
            "open_nodes",
        ]
    );
    assert!(tools.iter().all(|t| t.input_schema["type"] == "object"));
}

// =============================================================================
// TOOL CALL TESTS
// =============================================================================

#[tokio::test]
async fn test_create_then_read_graph() {
    let (server, _dir) = create_test_server();
    seed(&server).await;

    let data = call(&server, "read_graph", json!({})).await;
    assert!(!data.is_error);
    assert_eq!(data.content[0].kind, "text");

    let graph = payload(&data);
    assert_eq!(graph["entities"].as_array().unwrap().len(), 2);
    assert_eq!(graph["relations"][0]["from"], "Ada");
    assert_eq!(graph["relations"][0]["relationType"], "admires");
}

#[tokio::test]
async fn test_tool_args_may_be_omitted() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/tool/call")
        .json(&json!({"tool_name": "read_graph"}))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<ToolCallData> = response.json();
    let graph = payload(&body.data.unwrap());
    assert_eq!(graph, json!({"entities": [], "relations": []}));
}

#[tokio::test]
async fn test_search_nodes_is_case_insensitive() {
    let (server, _dir) = create_test_server();
    seed(&server).await;

    let data = call(&server, "search_nodes", json!({"query": "cobol"})).await;
    let graph = payload(&data);
    let entities = graph["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0]["name"], "Grace");
    // Only one endpoint matched, so the relation is filtered out.
    assert!(graph["relations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_open_nodes_returns_relations_between_requested() {
    let (server, _dir) = create_test_server();
    seed(&server).await;

    let data = call(&server, "open_nodes", json!({"names": ["Ada", "Grace"]})).await;
    let graph = payload(&data);
    assert_eq!(graph["entities"].as_array().unwrap().len(), 2);
    assert_eq!(graph["relations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_entities_cascades() {
    let (server, _dir) = create_test_server();
    seed(&server).await;

    let data = call(&server, "delete_entities", json!({"entityNames": ["Grace"]})).await;
    assert_eq!(data.content[0].text, "Entities deleted successfully");

    let graph = payload(&call(&server, "read_graph", json!({})).await);
    assert_eq!(graph["entities"].as_array().unwrap().len(), 1);
    assert!(graph["relations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_observations_missing_entity_is_error_payload() {
    let (server, _dir) = create_test_server();

    let data = call(
        &server,
        "add_observations",
        json!({"observations": [{"entityName": "Ghost", "contents": ["boo"]}]}),
    )
    .await;

    assert!(data.is_error);
    assert_eq!(data.content[0].text, "Error: Entity with name Ghost not found");
}

#[tokio::test]
async fn test_unknown_tool_is_bad_request() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/tool/call")
        .json(&json!({"tool_name": "drop_everything", "tool_args": {}}))
        .await;

    response.assert_status_bad_request();
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);
    assert_eq!(body.error.as_deref(), Some("Unknown tool: drop_everything"));
}

#[tokio::test]
async fn test_missing_tool_name_is_bad_request() {
    let (server, _dir) = create_test_server();

    let response = server.post("/tool/call").json(&json!({"tool_args": {}})).await;

    response.assert_status_bad_request();
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.error.as_deref(), Some("Missing tool_name"));
}

#[tokio::test]
async fn test_missing_required_argument_is_bad_request() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/tool/call")
        .json(&json!({"tool_name": "search_nodes", "tool_args": {}}))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_non_object_tool_args_is_bad_request() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/tool/call")
        .json(&json!({"tool_name": "read_graph", "tool_args": [1, 2, 3]}))
        .await;

    response.assert_status_bad_request();
}

// =============================================================================
// TOPICS TESTS
// =============================================================================

#[tokio::test]
async fn test_topics_lists_entity_names() {
    let (server, _dir) = create_test_server();
    seed(&server).await;

    let response = server.get("/topics").await;

    response.assert_status_ok();
    let body: ApiResponse<Vec<String>> = response.json();
    assert_eq!(body.data.unwrap(), ["Ada", "Grace"]);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _dir) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _dir) = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_non_json_body_is_client_error() {
    let (server, _dir) = create_test_server();

    let response = server.post("/tool/call").text("not valid json").await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// WRITE GUARD TESTS
// =============================================================================

const KEY: &str = "graph-writer-key";

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse().unwrap()
}

fn create_entity_body(name: &str) -> Value {
    json!({
        "tool_name": "create_entities",
        "tool_args": {"entities": [{"name": name, "entityType": "t", "observations": []}]},
    })
}

#[tokio::test]
async fn test_keyed_guard_accepts_bearer_write() {
    let (server, _dir) = create_guarded_server(WriteGuard::default().with_api_key(KEY));

    let response = server
        .post("/tool/call")
        .add_header(axum::http::header::AUTHORIZATION, bearer(KEY))
        .json(&create_entity_body("Ada"))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<StatusResponse> = server.get("/status").await.json();
    assert_eq!(body.data.unwrap().entity_count, 1);
}

#[tokio::test]
async fn test_keyed_guard_refuses_write_without_key() {
    let (server, _dir) = create_guarded_server(WriteGuard::default().with_api_key(KEY));

    let response = server.post("/tool/call").json(&create_entity_body("Ada")).await;

    assert_eq!(response.status_code().as_u16(), 401);
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);

    // Nothing reached the file.
    let body: ApiResponse<StatusResponse> = server.get("/status").await.json();
    assert_eq!(body.data.unwrap().entity_count, 0);
}

#[tokio::test]
async fn test_keyed_guard_refuses_wrong_key() {
    let (server, _dir) = create_guarded_server(WriteGuard::default().with_api_key(KEY));

    let response = server
        .post("/tool/call")
        .add_header(axum::http::header::AUTHORIZATION, bearer("someone-else"))
        .json(&json!({"tool_name": "delete_entities", "tool_args": {"entityNames": ["Ada"]}}))
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_keyed_guard_leaves_reads_open() {
    let (server, _dir) = create_guarded_server(WriteGuard::default().with_api_key(KEY));

    server.get("/status").await.assert_status_ok();
    server.get("/topics").await.assert_status_ok();
    let data = call(&server, "search_nodes", json!({"query": "anything"})).await;
    assert!(!data.is_error);
}

#[tokio::test]
async fn test_unknown_tool_is_bad_request_even_when_keyed() {
    let (server, _dir) = create_guarded_server(WriteGuard::default().with_api_key(KEY));

    let response = server
        .post("/tool/call")
        .json(&json!({"tool_name": "drop_everything"}))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_write_budget_throttles_mutations_only() {
    let (server, _dir) = create_guarded_server(WriteGuard::default().with_write_rate(1));

    server
        .post("/tool/call")
        .json(&create_entity_body("first"))
        .await
        .assert_status_ok();

    let throttled = server.post("/tool/call").json(&create_entity_body("second")).await;
    assert_eq!(throttled.status_code().as_u16(), 429);

    let data = call(&server, "read_graph", json!({})).await;
    let graph = payload(&data);
    assert_eq!(graph["entities"].as_array().unwrap().len(), 1);
}
