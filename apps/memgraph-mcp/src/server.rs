//! # memgraph MCP Server
//!
//! Implements `ServerHandler` by delegating to a `memgraph_core::Dispatcher`:
//! - `tools/list` and `tools/call` expose the nine graph tools;
//! - `resources/list` and `resources/read` expose `memory://<topic>`;
//! - every saved mutation pushes `notifications/resources/list_changed`.

use crate::completion::{Completion, PeerCompletion, complete_within};
use memgraph_core::{
    Dispatcher, MemoryError, ResourceBody, ResourceDescriptor, SubscriptionId, ToolDescriptor,
    ToolOutput,
};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::{NotificationContext, Peer, RequestContext},
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Server name announced during initialization.
pub const SERVER_NAME: &str = "memory-manager";

type PeerSlot = Arc<Mutex<Option<Peer<RoleServer>>>>;

// =============================================================================
// MCP SERVER
// =============================================================================

/// MCP server over one knowledge-graph store.
pub struct MemgraphMcp {
    dispatcher: Dispatcher,
    completion_timeout: Duration,
    peer: PeerSlot,
    subscription: SubscriptionId,
}

impl MemgraphMcp {
    /// Wrap a dispatcher and register the change listener.
    pub fn new(dispatcher: Dispatcher, completion_timeout: Duration) -> Self {
        let peer: PeerSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&peer);
        let subscription = dispatcher.subscribe(move || push_resources_changed(&slot));

        Self {
            dispatcher,
            completion_timeout,
            peer,
            subscription,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Remember the session peer used for change notifications.
    pub fn attach_peer(&self, peer: Peer<RoleServer>) {
        *self.peer.lock().unwrap_or_else(|e| e.into_inner()) = Some(peer);
    }

    // -------------------------------------------------------------------------
    // Protocol operations (transport independent)
    // -------------------------------------------------------------------------

    /// The tool catalogue as MCP tools.
    pub fn tools(&self) -> Vec<Tool> {
        self.dispatcher.list_tools().into_iter().map(to_mcp_tool).collect()
    }

    /// Run a tool call on the blocking pool.
    pub async fn call(
        &self,
        name: String,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let dispatcher = self.dispatcher.clone();
        let output = blocking(move || dispatcher.call_tool(&name, arguments))
            .await
            .map_err(to_mcp_error)?;
        Ok(to_call_result(output))
    }

    /// The resource catalogue as MCP resources.
    pub async fn resources(&self) -> Result<Vec<Resource>, McpError> {
        let dispatcher = self.dispatcher.clone();
        let listing = blocking(move || dispatcher.list_resources())
            .await
            .map_err(to_mcp_error)?;
        Ok(listing.into_iter().map(to_mcp_resource).collect())
    }

    /// Resolve a resource to text, generating it through `completion` when
    /// the topic requires it.
    pub async fn read<C: Completion>(&self, uri: &str, completion: &C) -> Result<String, MemoryError> {
        let dispatcher = self.dispatcher.clone();
        let target = uri.to_string();
        match blocking(move || dispatcher.resolve_resource(&target)).await? {
            ResourceBody::Text(text) => Ok(text),
            ResourceBody::Generate(request) => {
                tracing::debug!(uri, max_tokens = request.max_tokens, "Generating topic resource");
                complete_within(completion, request, self.completion_timeout).await
            }
        }
    }
}

impl Drop for MemgraphMcp {
    fn drop(&mut self) {
        self.dispatcher.unsubscribe(self.subscription);
    }
}

// =============================================================================
// SERVER HANDLER
// =============================================================================

impl ServerHandler for MemgraphMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Knowledge-graph memory. Use the tools to create, search and delete \
                 entities, relations and observations. Read memory://all-topics for \
                 the list of entity names, or memory://<topic> for generated text."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_resources_list_changed()
                .build(),
            ..Default::default()
        }
    }

    async fn on_initialized(&self, context: NotificationContext<RoleServer>) {
        self.attach_peer(context.peer);
        tracing::info!("MCP session initialized");
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call(request.name.into_owned(), request.arguments).await
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(self.resources().await?))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let completion = PeerCompletion::new(context.peer);
        let text = self
            .read(&request.uri, &completion)
            .await
            .map_err(to_mcp_error)?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}

// =============================================================================
// CHANGE NOTIFICATIONS
// =============================================================================

/// Schedule `notifications/resources/list_changed` on the session, if any.
///
/// Runs on the thread that saved the graph, so it only spawns.
fn push_resources_changed(slot: &PeerSlot) -> Result<(), String> {
    let Some(peer) = slot.lock().unwrap_or_else(|e| e.into_inner()).clone() else {
        return Ok(());
    };
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;

    runtime.spawn(async move {
        if let Err(e) = peer.notify_resource_list_changed().await {
            tracing::warn!("Failed to push resource list change: {}", e);
        }
    });
    Ok(())
}

// =============================================================================
// CONVERSIONS
// =============================================================================

/// Run synchronous engine work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, MemoryError>
where
    F: FnOnce() -> Result<T, MemoryError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MemoryError::Persistence(format!("engine task failed: {}", e)))?
}

fn to_mcp_error(error: MemoryError) -> McpError {
    match error {
        MemoryError::InvalidRequest(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn to_mcp_tool(descriptor: ToolDescriptor) -> Tool {
    let schema: JsonObject = match descriptor.input_schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    Tool::new(descriptor.name, descriptor.description, Arc::new(schema))
}

fn to_call_result(output: ToolOutput) -> CallToolResult {
    let content = vec![Content::text(output.text)];
    if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

fn to_mcp_resource(descriptor: ResourceDescriptor) -> Resource {
    let mut raw = RawResource::new(descriptor.uri, descriptor.name);
    raw.description = Some(descriptor.description);
    raw.mime_type = Some(descriptor.mime_type);
    raw.no_annotation()
}

// =============================================================================
// TESTS
// =============================================================================
