//! # Query Module
//!
//! Read-only views over a loaded `KnowledgeGraph`.
//!
//! Both filters return a sub-graph: the selected entities in file order, plus
//! the relations whose endpoints are *both* selected.

use crate::{Entity, KnowledgeGraph};
use std::collections::BTreeSet;

/// Case-insensitive substring search over name, type and observations.
///
/// An empty query matches every entity.
#[must_use]
pub fn search(graph: &KnowledgeGraph, query: &str) -> KnowledgeGraph {
    let needle = query.to_lowercase();
    subgraph(graph, |entity| entity.matches_lowercase(&needle))
}

/// Exact-name selection.
#[must_use]
pub fn open<S: AsRef<str>>(graph: &KnowledgeGraph, names: &[S]) -> KnowledgeGraph {
    let wanted: BTreeSet<&str> = names.iter().map(|n| n.as_ref()).collect();
    subgraph(graph, |entity| wanted.contains(entity.name.as_str()))
}

fn subgraph<F>(graph: &KnowledgeGraph, mut keep: F) -> KnowledgeGraph
where
    F: FnMut(&Entity) -> bool,
{
    let entities: Vec<Entity> = graph.entities.iter().filter(|e| keep(e)).cloned().collect();
    let names: BTreeSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    let relations = graph.relations_within(&names);

    KnowledgeGraph::with_data(entities, relations)
}

// =============================================================================
// TESTS
// =============================================================================
