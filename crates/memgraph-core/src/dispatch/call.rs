//! Typed tool calls decoded from `(name, arguments)`.

use super::catalogue::ToolKind;
use crate::{Entity, MemoryError, ObservationAddition, ObservationDeletion, Relation};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Arguments object as received from a transport.
pub type ToolArguments = Map<String, Value>;

/// One decoded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    CreateEntities(Vec<Entity>),
    CreateRelations(Vec<Relation>),
    AddObservations(Vec<ObservationAddition>),
    DeleteEntities(Vec<String>),
    DeleteObservations(Vec<ObservationDeletion>),
    DeleteRelations(Vec<Relation>),
    ReadGraph,
    SearchNodes(String),
    OpenNodes(Vec<String>),
}

impl ToolCall {
    /// Decode a call. Every failure is an `InvalidRequest` naming the tool
    /// and, where relevant, the argument.
    pub fn decode(name: &str, arguments: Option<ToolArguments>) -> Result<Self, MemoryError> {
        let kind = ToolKind::from_name(name)
            .ok_or_else(|| MemoryError::InvalidRequest(format!("Unknown tool: {}", name)))?;

        if kind == ToolKind::ReadGraph {
            return Ok(Self::ReadGraph);
        }

        let mut args = arguments.ok_or_else(|| {
            MemoryError::InvalidRequest(format!("Missing arguments for tool '{}'", name))
        })?;

        let call = match kind {
            ToolKind::CreateEntities => Self::CreateEntities(take(&mut args, kind, "entities")?),
            ToolKind::CreateRelations => {
                Self::CreateRelations(take(&mut args, kind, "relations")?)
            }
            ToolKind::AddObservations => {
                Self::AddObservations(take(&mut args, kind, "observations")?)
            }
            ToolKind::DeleteEntities => {
                Self::DeleteEntities(take(&mut args, kind, "entityNames")?)
            }
            ToolKind::DeleteObservations => {
                Self::DeleteObservations(take(&mut args, kind, "deletions")?)
            }
            ToolKind::DeleteRelations => {
                Self::DeleteRelations(take(&mut args, kind, "relations")?)
            }
            ToolKind::ReadGraph => Self::ReadGraph,
            ToolKind::SearchNodes => Self::SearchNodes(take(&mut args, kind, "query")?),
            ToolKind::OpenNodes => Self::OpenNodes(take(&mut args, kind, "names")?),
        };
        Ok(call)
    }

    /// The tool this call targets.
    #[must_use]
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::CreateEntities(_) => ToolKind::CreateEntities,
            Self::CreateRelations(_) => ToolKind::CreateRelations,
            Self::AddObservations(_) => ToolKind::AddObservations,
            Self::DeleteEntities(_) => ToolKind::DeleteEntities,
            Self::DeleteObservations(_) => ToolKind::DeleteObservations,
            Self::DeleteRelations(_) => ToolKind::DeleteRelations,
            Self::ReadGraph => ToolKind::ReadGraph,
            Self::SearchNodes(_) => ToolKind::SearchNodes,
            Self::OpenNodes(_) => ToolKind::OpenNodes,
        }
    }
}

/// Remove `key` from `args` and deserialize it.
fn take<T: DeserializeOwned>(
    args: &mut ToolArguments,
    tool: ToolKind,
    key: &str,
) -> Result<T, MemoryError> {
    let value = args.remove(key).ok_or_else(|| {
        MemoryError::InvalidRequest(format!(
            "Missing required argument '{}' for tool '{}'",
            key, tool
        ))
    })?;

    serde_json::from_value(value).map_err(|e| {
        MemoryError::InvalidRequest(format!(
            "Invalid argument '{}' for tool '{}': {}",
            key, tool, e
        ))
    })
}
