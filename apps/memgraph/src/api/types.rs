//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Tool endpoints wrap their payload in an envelope:
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.

use memgraph_core::{GraphStats, ToolDescriptor, ToolOutput};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Graph status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub entity_count: usize,
    pub relation_count: usize,
    pub observation_count: usize,
    pub memory_path: String,
}

impl StatusResponse {
    #[must_use]
    pub fn new(stats: GraphStats, memory_path: String) -> Self {
        Self {
            entity_count: stats.entity_count,
            relation_count: stats.relation_count,
            observation_count: stats.observation_count,
            memory_path,
        }
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// `{success, data}` / `{success, error}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// =============================================================================
// TOOLS
// =============================================================================

/// One entry of `GET /tools`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl From<ToolDescriptor> for ToolInfo {
    fn from(descriptor: ToolDescriptor) -> Self {
        Self {
            name: descriptor.name,
            description: descriptor.description,
            input_schema: descriptor.input_schema,
        }
    }
}

/// Body of `POST /tool/call`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_args: Option<serde_json::Value>,
}

/// A text content block, as returned by an MCP tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// `data` of a successful `POST /tool/call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallData {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

impl From<ToolOutput> for ToolCallData {
    fn from(output: ToolOutput) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text".to_string(),
                text: output.text,
            }],
            is_error: output.is_error,
        }
    }
}
