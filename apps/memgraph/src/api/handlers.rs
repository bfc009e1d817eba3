//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Engine work is synchronous file I/O, so every handler hands it to
//! `tokio::task::spawn_blocking`.

use super::{
    AppState,
    types::{ApiResponse, HealthResponse, StatusResponse, ToolCallData, ToolCallRequest, ToolInfo},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use memgraph_core::{MemoryError, ToolArguments, ToolKind};
use serde_json::Value;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get graph counters and the backing file path.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let memory_path = dispatcher.store().path().display().to_string();

    match run_blocking(move || dispatcher.stats()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::ok(StatusResponse::new(stats, memory_path))),
        ),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// TOOL HANDLERS
// =============================================================================

/// List the tool catalogue.
pub async fn tools_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tools: Vec<ToolInfo> = state
        .dispatcher
        .list_tools()
        .into_iter()
        .map(ToolInfo::from)
        .collect();
    (StatusCode::OK, Json(ApiResponse::ok(tools)))
}

/// Invoke a tool.
///
/// Engine failures are still `success: true`; the payload carries
/// `is_error: true` and an `Error: ...` text, as on the MCP transport.
/// Mutating tools pass through the write guard first (401 / 429).
pub async fn tool_call_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ToolCallRequest>,
) -> impl IntoResponse {
    let Some(tool_name) = request.tool_name.filter(|n| !n.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing tool_name")),
        );
    };

    if let Some(kind) = ToolKind::from_name(&tool_name) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if let Err(rejection) = state.guard.check(kind, authorization) {
            return (
                rejection.status(),
                Json(ApiResponse::error(rejection.message())),
            );
        }
    }

    let arguments = match tool_arguments(request.tool_args) {
        Ok(arguments) => arguments,
        Err(e) => return error_response(&e),
    };

    let dispatcher = state.dispatcher.clone();
    match run_blocking(move || dispatcher.call_tool(&tool_name, arguments)).await {
        Ok(output) => (
            StatusCode::OK,
            Json(ApiResponse::ok(ToolCallData::from(output))),
        ),
        Err(e) => error_response(&e),
    }
}

/// `tool_args` defaults to an empty object; anything but an object is rejected.
fn tool_arguments(args: Option<Value>) -> Result<Option<ToolArguments>, MemoryError> {
    match args {
        None | Some(Value::Null) => Ok(Some(ToolArguments::new())),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(MemoryError::InvalidRequest(format!(
            "tool_args must be an object, got {}",
            other
        ))),
    }
}

// =============================================================================
// TOPICS HANDLER
// =============================================================================

/// Entity names, as served by the `memory://all-topics` resource.
pub async fn topics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    match run_blocking(move || dispatcher.engine().entity_names()).await {
        Ok(names) => (StatusCode::OK, Json(ApiResponse::ok(names))),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn run_blocking<T, F>(work: F) -> Result<T, MemoryError>
where
    F: FnOnce() -> Result<T, MemoryError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MemoryError::Persistence(format!("engine task failed: {}", e)))?
}

fn error_response<T>(error: &MemoryError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match error {
        MemoryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    }
    (status, Json(ApiResponse::error(error.to_string())))
}
