//! # memgraph HTTP API Module
//!
//! This module implements the HTTP REST bridge using axum.
//!
//! ## Endpoints
//!
//! - `GET /tools` - Tool catalogue
//! - `POST /tool/call` - Invoke a tool (`{tool_name, tool_args}`)
//! - `GET /topics` - Entity names (the `all-topics` listing)
//! - `GET /status` - Graph counters
//! - `GET /health` - Health check
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `MEMGRAPH_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `MEMGRAPH_API_KEY`, `MEMGRAPH_WRITE_RATE`: protection for mutating tool calls, see [`WriteGuard`]

mod guard;
mod handlers;
mod types;

pub use guard::{ENV_API_KEY, ENV_WRITE_RATE, GuardRejection, WriteGuard};
pub use handlers::{
    health_handler, status_handler, tool_call_handler, tools_handler, topics_handler,
};
pub use types::{
    ApiResponse, HealthResponse, StatusResponse, TextContent, ToolCallData, ToolCallRequest,
    ToolInfo,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use memgraph_core::{Dispatcher, MemoryError};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding the allowed CORS origins.
pub const ENV_CORS_ORIGINS: &str = "MEMGRAPH_CORS_ORIGINS";

/// Maximum accepted request body (2 MB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the dispatcher and the guard for mutating calls.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub guard: WriteGuard,
}

impl AppState {
    /// State with an open guard.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            guard: WriteGuard::default(),
        }
    }

    #[must_use]
    pub fn with_guard(mut self, guard: WriteGuard) -> Self {
        self.guard = guard;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `MEMGRAPH_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(ENV_CORS_ORIGINS).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins ({}=*). This is insecure for production!",
                ENV_CORS_ORIGINS
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    ENV_CORS_ORIGINS
                );
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!(
                "CORS: No {} set, defaulting to localhost only",
                ENV_CORS_ORIGINS
            );
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8000",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
///
/// Mutating tool calls are checked by `state.guard` inside the handler,
/// once the tool name is known.
pub fn create_router(state: AppState) -> Router {
    if state.guard.requires_key() {
        tracing::info!("Mutating tools require {}", ENV_API_KEY);
    } else {
        tracing::warn!(
            "Mutating tools are open to every client. Set {} to require a key.",
            ENV_API_KEY
        );
    }
    if !state.guard.limits_writes() {
        tracing::info!("Write budget disabled");
    }

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/tools", get(handlers::tools_handler))
        .route("/tool/call", post(handlers::tool_call_handler))
        .route("/topics", get(handlers::topics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(addr: &str, dispatcher: Dispatcher) -> Result<(), MemoryError> {
    let router = create_router(AppState::new(dispatcher).with_guard(WriteGuard::from_env()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MemoryError::Config(format!("Bind failed on {}: {}", addr, e)))?;

    tracing::info!("memgraph HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MemoryError::Config(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
