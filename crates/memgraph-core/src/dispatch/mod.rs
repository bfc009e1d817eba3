//! # Tool Dispatcher
//!
//! The protocol-facing surface of the engine. Transports talk to a
//! `Dispatcher` only:
//! - `list_tools` / `call_tool` for the tool protocol;
//! - `list_resources` / `resolve_resource` for topic resources;
//! - `subscribe` / `unsubscribe` for change notifications.
//!
//! ## Error Channels
//!
//! `InvalidRequest` (unknown tool, missing or malformed argument, bad URI) is
//! returned as `Err` before the engine is touched. Engine failures on the
//! tool path become an error payload (`ToolOutput::is_error`) whose text
//! starts with `Error: `.

mod call;
mod catalogue;

pub use call::{ToolArguments, ToolCall};
pub use catalogue::{ToolDescriptor, ToolKind, tools};

use crate::config::MemoryConfig;
use crate::mutation::MutationEngine;
use crate::notifier::SubscriptionId;
use crate::resources::{self, ResourceBody, ResourceDescriptor, ResourceRequest};
use crate::store::GraphStore;
use crate::{GraphStats, MemoryError};
use serde::Serialize;
use std::sync::Arc;

/// Fixed payload of `delete_entities`.
pub const ENTITIES_DELETED: &str = "Entities deleted successfully";
/// Fixed payload of `delete_observations`.
pub const OBSERVATIONS_DELETED: &str = "Observations deleted successfully";
/// Fixed payload of `delete_relations`.
pub const RELATIONS_DELETED: &str = "Relations deleted successfully";

/// The text payload of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful payload.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// An error payload: `Error: <message>`.
    #[must_use]
    pub fn failure(error: &MemoryError) -> Self {
        Self {
            text: format!("Error: {}", error),
            is_error: true,
        }
    }
}

/// Tool and resource dispatcher over one store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: MutationEngine,
    max_tokens: u32,
}

impl Dispatcher {
    /// Create a dispatcher over an engine.
    #[must_use]
    pub fn new(engine: MutationEngine, max_tokens: u32) -> Self {
        Self { engine, max_tokens }
    }

    /// Open the configured store and wrap it.
    pub fn from_config(config: &MemoryConfig) -> Result<Self, MemoryError> {
        let store = GraphStore::from_config(config)?;
        Ok(Self::new(
            MutationEngine::new(Arc::new(store)),
            config.completion.max_tokens,
        ))
    }

    #[must_use]
    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    #[must_use]
    pub fn store(&self) -> &Arc<GraphStore> {
        self.engine.store()
    }

    // -------------------------------------------------------------------------
    // Tools
    // -------------------------------------------------------------------------

    /// The tool catalogue.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        tools()
    }

    /// Decode and run a tool call.
    pub fn call_tool(
        &self,
        name: &str,
        arguments: Option<ToolArguments>,
    ) -> Result<ToolOutput, MemoryError> {
        let call = ToolCall::decode(name, arguments)?;
        Ok(self.execute(call))
    }

    /// Run an already decoded call. Engine errors become error payloads.
    pub fn execute(&self, call: ToolCall) -> ToolOutput {
        let kind = call.kind();
        match self.run(call) {
            Ok(text) => {
                tracing::debug!(tool = %kind, mutation = kind.is_mutation(), "Tool call succeeded");
                ToolOutput::success(text)
            }
            Err(e) => {
                tracing::warn!(tool = %kind, "Tool call failed: {}", e);
                ToolOutput::failure(&e)
            }
        }
    }

    /// Run an already decoded call, keeping the engine error.
    ///
    /// Returns the success payload text.
    pub fn run(&self, call: ToolCall) -> Result<String, MemoryError> {
        match call {
            ToolCall::CreateEntities(entities) => to_pretty(&self.engine.create_entities(entities)?),
            ToolCall::CreateRelations(relations) => {
                to_pretty(&self.engine.create_relations(relations)?)
            }
            ToolCall::AddObservations(additions) => {
                to_pretty(&self.engine.add_observations(additions)?)
            }
            ToolCall::DeleteEntities(names) => {
                self.engine.delete_entities(names)?;
                Ok(ENTITIES_DELETED.to_string())
            }
            ToolCall::DeleteObservations(deletions) => {
                self.engine.delete_observations(deletions)?;
                Ok(OBSERVATIONS_DELETED.to_string())
            }
            ToolCall::DeleteRelations(relations) => {
                self.engine.delete_relations(relations)?;
                Ok(RELATIONS_DELETED.to_string())
            }
            ToolCall::ReadGraph => to_pretty(&self.engine.read_graph()?),
            ToolCall::SearchNodes(query) => to_pretty(&self.engine.search_nodes(&query)?),
            ToolCall::OpenNodes(names) => to_pretty(&self.engine.open_nodes(&names)?),
        }
    }

    // -------------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------------

    /// The sentinel resource, then one resource per entity.
    pub fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, MemoryError> {
        let names = self.engine.entity_names()?;
        Ok(resources::catalogue(&names))
    }

    /// Resolve a resource URI to a ready body or a completion request.
    ///
    /// The sentinel topic never produces a completion request.
    pub fn resolve_resource(&self, uri: &str) -> Result<ResourceBody, MemoryError> {
        match ResourceRequest::parse(uri)? {
            ResourceRequest::AllTopics => {
                let names = self.engine.entity_names()?;
                Ok(ResourceBody::Text(resources::render_topic_list(&names)))
            }
            ResourceRequest::Topic(topic) => {
                let matches = self.engine.search_nodes(&topic)?;
                Ok(ResourceBody::Generate(resources::prepare_topic(
                    &topic,
                    &matches,
                    self.max_tokens,
                )))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Status / subscriptions
    // -------------------------------------------------------------------------

    /// Graph counters.
    pub fn stats(&self) -> Result<GraphStats, MemoryError> {
        self.engine.stats()
    }

    /// Register a change listener on the store.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.store().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store().unsubscribe(id)
    }
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String, MemoryError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| MemoryError::Persistence(format!("cannot render payload: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LoadPolicy;
    use crate::{Entity, KnowledgeGraph};
    use serde_json::{Value, json};

    fn dispatcher() -> (tempfile::TempDir, Dispatcher) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GraphStore::open(dir.path().join("memory.jsonl"), LoadPolicy::Fail)
            .expect("open");
        let engine = MutationEngine::new(Arc::new(store));
        (dir, Dispatcher::new(engine, 256))
    }

    fn args(value: Value) -> Option<ToolArguments> {
        value.as_object().cloned()
    }

    #[test]
    fn create_returns_pretty_json_of_inserted() {
        let (_dir, dispatcher) = dispatcher();
        let output = dispatcher
            .call_tool(
                "create_entities",
                args(json!({"entities": [{"name": "A", "entityType": "t", "observations": []}]})),
            )
            .expect("call");

        assert!(!output.is_error);
        assert_eq!(
            output.text,
            "[\n  {\n    \"name\": \"A\",\n    \"entityType\": \"t\",\n    \"observations\": []\n  }\n]"
        );
    }

    #[test]
    fn delete_returns_fixed_message() {
        let (_dir, dispatcher) = dispatcher();
        let output = dispatcher
            .call_tool("delete_entities", args(json!({"entityNames": ["A"]})))
            .expect("call");
        assert_eq!(output, ToolOutput::success("Entities deleted successfully"));

        let output = dispatcher
            .call_tool("delete_relations", args(json!({"relations": []})))
            .expect("call");
        assert_eq!(output.text, RELATIONS_DELETED);
    }

    #[test]
    fn engine_failure_becomes_error_payload() {
        let (_dir, dispatcher) = dispatcher();
        let output = dispatcher
            .call_tool(
                "add_observations",
                args(json!({"observations": [{"entityName": "Ghost", "contents": ["x"]}]})),
            )
            .expect("call");

        assert!(output.is_error);
        assert_eq!(output.text, "Error: Entity with name Ghost not found");
    }

    #[test]
    fn invalid_request_is_returned_as_err() {
        let (_dir, dispatcher) = dispatcher();
        let err = dispatcher.call_tool("nope", None).expect_err("unknown");
        assert!(matches!(err, MemoryError::InvalidRequest(_)));
    }

    #[test]
    fn read_graph_payload_parses_back() {
        let (_dir, dispatcher) = dispatcher();
        dispatcher
            .engine()
            .create_entities(vec![Entity::new("A", "t", vec![])])
            .expect("create");

        let output = dispatcher.call_tool("read_graph", None).expect("call");
        let graph: KnowledgeGraph = serde_json::from_str(&output.text).expect("parse");
        assert_eq!(graph.entity_names(), vec!["A"]);
    }

    #[test]
    fn sentinel_resource_lists_names_without_generation() {
        let (_dir, dispatcher) = dispatcher();
        dispatcher
            .engine()
            .create_entities(vec![Entity::new("A", "t", vec![]), Entity::new("B", "t", vec![])])
            .expect("create");

        let body = dispatcher
            .resolve_resource("memory://all-topics")
            .expect("resolve");
        assert_eq!(body, ResourceBody::Text("A\nB".to_string()));
    }

    #[test]
    fn topic_resource_requests_generation() {
        let (_dir, dispatcher) = dispatcher();
        dispatcher
            .engine()
            .create_entities(vec![Entity::new("Paris", "City", vec![])])
            .expect("create");

        match dispatcher.resolve_resource("memory://paris").expect("resolve") {
            ResourceBody::Generate(request) => {
                assert!(request.prompt.contains("- Paris (City)"));
                assert_eq!(request.max_tokens, 256);
            }
            other => unreachable!("expected a completion request, got {other:?}"),
        }
    }

    #[test]
    fn list_resources_tracks_entities() {
        let (_dir, dispatcher) = dispatcher();
        assert_eq!(dispatcher.list_resources().expect("list").len(), 1);

        dispatcher
            .engine()
            .create_entities(vec![Entity::new("A", "t", vec![])])
            .expect("create");
        let uris: Vec<String> = dispatcher
            .list_resources()
            .expect("list")
            .into_iter()
            .map(|r| r.uri)
            .collect();
        assert_eq!(uris, vec!["memory://all-topics", "memory://A"]);
    }
}
