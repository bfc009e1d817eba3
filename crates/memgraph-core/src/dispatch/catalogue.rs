//! Tool catalogue: names, descriptions and JSON Schemas for the nine tools.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The operations reachable through the tool protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CreateEntities,
    CreateRelations,
    AddObservations,
    DeleteEntities,
    DeleteObservations,
    DeleteRelations,
    ReadGraph,
    SearchNodes,
    OpenNodes,
}

impl ToolKind {
    /// Every tool, in catalogue order.
    pub const ALL: [ToolKind; 9] = [
        Self::CreateEntities,
        Self::CreateRelations,
        Self::AddObservations,
        Self::DeleteEntities,
        Self::DeleteObservations,
        Self::DeleteRelations,
        Self::ReadGraph,
        Self::SearchNodes,
        Self::OpenNodes,
    ];

    /// Look up a tool by its protocol name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Protocol name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateEntities => "create_entities",
            Self::CreateRelations => "create_relations",
            Self::AddObservations => "add_observations",
            Self::DeleteEntities => "delete_entities",
            Self::DeleteObservations => "delete_observations",
            Self::DeleteRelations => "delete_relations",
            Self::ReadGraph => "read_graph",
            Self::SearchNodes => "search_nodes",
            Self::OpenNodes => "open_nodes",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CreateEntities => "Create multiple new entities in the knowledge graph",
            Self::CreateRelations => {
                "Create multiple new relations between entities in the knowledge graph"
            }
            Self::AddObservations => "Add new observations to existing entities",
            Self::DeleteEntities => "Delete multiple entities and their relations",
            Self::DeleteObservations => "Delete specific observations from entities",
            Self::DeleteRelations => "Delete multiple relations from the graph",
            Self::ReadGraph => "Read the entire knowledge graph",
            Self::SearchNodes => "Search for nodes in the graph",
            Self::OpenNodes => "Open specific nodes by their names",
        }
    }

    /// True for tools that rewrite the backing file.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::ReadGraph | Self::SearchNodes | Self::OpenNodes)
    }

    /// JSON Schema of the arguments object.
    #[must_use]
    pub fn input_schema(self) -> Value {
        match self {
            Self::CreateEntities => object_schema("entities", array_of(entity_schema())),
            Self::CreateRelations | Self::DeleteRelations => {
                object_schema("relations", array_of(relation_schema()))
            }
            Self::AddObservations => object_schema(
                "observations",
                array_of(json!({
                    "type": "object",
                    "properties": {
                        "entityName": { "type": "string" },
                        "contents": array_of(string_schema()),
                    },
                    "required": ["entityName", "contents"],
                })),
            ),
            Self::DeleteEntities => object_schema("entityNames", array_of(string_schema())),
            Self::DeleteObservations => object_schema(
                "deletions",
                array_of(json!({
                    "type": "object",
                    "properties": {
                        "entityName": { "type": "string" },
                        "observations": array_of(string_schema()),
                    },
                    "required": ["entityName", "observations"],
                })),
            ),
            Self::ReadGraph => json!({ "type": "object", "properties": {} }),
            Self::SearchNodes => object_schema("query", string_schema()),
            Self::OpenNodes => object_schema("names", array_of(string_schema())),
        }
    }

    /// Catalogue entry for this tool.
    #[must_use]
    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A tool as advertised to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// The full catalogue, in order.
#[must_use]
pub fn tools() -> Vec<ToolDescriptor> {
    ToolKind::ALL.into_iter().map(ToolKind::descriptor).collect()
}

// -----------------------------------------------------------------------------
// Schema fragments
// -----------------------------------------------------------------------------

fn string_schema() -> Value {
    json!({ "type": "string" })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn object_schema(key: &str, property: Value) -> Value {
    json!({
        "type": "object",
        "properties": { key: property },
        "required": [key],
    })
}

fn entity_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "entityType": { "type": "string" },
            "observations": array_of(string_schema()),
        },
        "required": ["name", "entityType", "observations"],
    })
}

fn relation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "from": { "type": "string", "description": "Source entity name (legacy alias: from_)" },
            "to": { "type": "string" },
            "relationType": { "type": "string" },
        },
        "required": ["from", "to", "relationType"],
    })
}
