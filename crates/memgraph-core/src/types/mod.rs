//! # Core Type Definitions
//!
//! This module contains the value objects of the knowledge graph:
//! - Graph members (`Entity`, `Relation`, `KnowledgeGraph`)
//! - Observation batches (`ObservationAddition`, `ObservationDeletion`, `AddedObservations`)
//! - Counters (`GraphStats`)
//! - Error types (`MemoryError`)
//!
//! ## Wire Names
//!
//! All types serialize with the camelCase field names used by the tool
//! protocol (`entityType`, `relationType`, `entityName`, ...). A relation's
//! source endpoint is `from` on the wire; `from_` is accepted on input for
//! clients built against the legacy schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

// =============================================================================
// ENTITY
// =============================================================================

/// A named node in the knowledge graph.
///
/// `name` is the unique key. Observations keep insertion order and never
/// contain the same string twice once the entity has passed through the
/// Mutation Engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub entity_type: String,
    pub observations: Vec<String>,
}

impl Entity {
    /// Create a new entity.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        observations: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            observations,
        }
    }

    /// Check whether this entity already records an observation.
    #[must_use]
    pub fn has_observation(&self, observation: &str) -> bool {
        self.observations.iter().any(|o| o == observation)
    }

    /// Case-insensitive substring match against name, type and observations.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.entity_type.to_lowercase().contains(needle)
            || self
                .observations
                .iter()
                .any(|o| o.to_lowercase().contains(needle))
    }
}

// =============================================================================
// RELATION
// =============================================================================

/// A directed, typed edge between two entities, referenced by name.
///
/// Identity is the `(from, to, relation_type)` triple. Endpoints are not
/// checked against the entity set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(alias = "from_")]
    pub from: String,
    pub to: String,
    pub relation_type: String,
}

impl Relation {
    /// Create a new relation.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation_type: relation_type.into(),
        }
    }

    /// True if either endpoint is `name`.
    #[must_use]
    pub fn touches(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }

    /// True if this relation has the same triple as `other`.
    #[must_use]
    pub fn same_triple(&self, other: &Relation) -> bool {
        self.from == other.from && self.to == other.to && self.relation_type == other.relation_type
    }
}

// =============================================================================
// KNOWLEDGE GRAPH
// =============================================================================

/// The persisted aggregate: all entities and all relations, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from parts.
    #[must_use]
    pub fn with_data(entities: Vec<Entity>, relations: Vec<Relation>) -> Self {
        Self {
            entities,
            relations,
        }
    }

    /// Check if the graph holds no entities and no relations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// Find an entity by exact name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Find an entity by exact name, mutably.
    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    /// Check if an entity with this name exists.
    #[must_use]
    pub fn contains_entity(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    /// Check if a relation with the same triple exists.
    #[must_use]
    pub fn contains_relation(&self, relation: &Relation) -> bool {
        self.relations.iter().any(|r| r.same_triple(relation))
    }

    /// All entity names in file order.
    #[must_use]
    pub fn entity_names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }

    /// Keep only relations whose endpoints are both in `names`.
    #[must_use]
    pub fn relations_within(&self, names: &BTreeSet<&str>) -> Vec<Relation> {
        self.relations
            .iter()
            .filter(|r| names.contains(r.from.as_str()) && names.contains(r.to.as_str()))
            .cloned()
            .collect()
    }

    /// Drop duplicate entity names and duplicate relation triples.
    ///
    /// The first occurrence wins. Returns how many records were dropped.
    pub fn dedup(&mut self) -> usize {
        let before = self.entities.len() + self.relations.len();

        let mut seen_names = BTreeSet::new();
        self.entities.retain(|e| seen_names.insert(e.name.clone()));

        let mut seen_triples = BTreeSet::new();
        self.relations.retain(|r| seen_triples.insert(r.clone()));

        before - (self.entities.len() + self.relations.len())
    }

    /// Counters for status reporting.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            entity_count: self.entities.len(),
            relation_count: self.relations.len(),
            observation_count: self.entities.iter().map(|e| e.observations.len()).sum(),
        }
    }
}

// =============================================================================
// OBSERVATION BATCHES
// =============================================================================

/// One entry of an `add_observations` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationAddition {
    pub entity_name: String,
    pub contents: Vec<String>,
}

impl ObservationAddition {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, contents: Vec<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            contents,
        }
    }
}

/// The observations actually appended to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedObservations {
    pub entity_name: String,
    pub added_observations: Vec<String>,
}

/// One entry of a `delete_observations` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDeletion {
    pub entity_name: String,
    pub observations: Vec<String>,
}

impl ObservationDeletion {
    #[must_use]
    pub fn new(entity_name: impl Into<String>, observations: Vec<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            observations,
        }
    }
}

// =============================================================================
// STATS
// =============================================================================

/// Graph counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub entity_count: usize,
    pub relation_count: usize,
    pub observation_count: usize,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in memgraph.
///
/// - `InvalidRequest` is raised before any engine call and never leaves a
///   partial mutation behind.
/// - `Persistence` is never swallowed; `CorruptGraph` only appears under
///   `LoadPolicy::Fail`.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A referenced entity does not exist where one is required.
    #[error("Entity with name {0} not found")]
    NotFound(String),

    /// Unknown operation, missing or malformed argument, unusable URI.
    #[error("{0}")]
    InvalidRequest(String),

    /// The backing file could not be written.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// The backing file could not be read or decoded.
    #[error("Corrupt graph file: {0}")]
    CorruptGraph(String),

    /// The completion collaborator failed or timed out.
    #[error("Completion failed: {0}")]
    Completion(String),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_accepts_legacy_from_field() {
        let json = r#"{"from_":"A","to":"B","relationType":"knows"}"#;
        let relation: Relation = serde_json::from_str(json).expect("parse");
        assert_eq!(relation, Relation::new("A", "B", "knows"));
    }

    #[test]
    fn relation_serializes_from_field() {
        let json = serde_json::to_string(&Relation::new("A", "B", "knows")).expect("serialize");
        assert_eq!(json, r#"{"from":"A","to":"B","relationType":"knows"}"#);
    }

    #[test]
    fn entity_matches_any_field() {
        let entity = Entity::new("Paris", "City", vec!["capital of France".into()]);
        assert!(entity.matches_lowercase("par"));
        assert!(entity.matches_lowercase("city"));
        assert!(entity.matches_lowercase("france"));
        assert!(!entity.matches_lowercase("tokyo"));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut graph = KnowledgeGraph::with_data(
            vec![
                Entity::new("A", "first", vec![]),
                Entity::new("A", "second", vec![]),
                Entity::new("B", "only", vec![]),
            ],
            vec![Relation::new("A", "B", "r"), Relation::new("A", "B", "r")],
        );

        assert_eq!(graph.dedup(), 2);
        assert_eq!(graph.entities.len(), 2);
        assert_eq!(graph.entity("A").map(|e| e.entity_type.as_str()), Some("first"));
        assert_eq!(graph.relations.len(), 1);
    }

    #[test]
    fn stats_count_observations() {
        let graph = KnowledgeGraph::with_data(
            vec![
                Entity::new("A", "t", vec!["x".into(), "y".into()]),
                Entity::new("B", "t", vec!["z".into()]),
            ],
            vec![Relation::new("A", "B", "r")],
        );
        let stats = graph.stats();
        assert_eq!(stats.entity_count, 2);
        assert_eq!(stats.relation_count, 1);
        assert_eq!(stats.observation_count, 3);
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = MemoryError::NotFound("Ghost".into());
        assert_eq!(err.to_string(), "Entity with name Ghost not found");
    }
}
