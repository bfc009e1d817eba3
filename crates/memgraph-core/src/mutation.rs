//! # Mutation Engine
//!
//! The graph operations exposed through the tool protocol.
//!
//! Every operation is one exclusion-region transaction on the owned
//! `GraphStore`:
//! - Mutations load, change and save the whole graph, even when nothing
//!   changed, and therefore always notify listeners.
//! - Reads load and filter, and never save.

use crate::query;
use crate::store::GraphStore;
use crate::{
    AddedObservations, Entity, GraphStats, KnowledgeGraph, MemoryError, ObservationAddition,
    ObservationDeletion, Relation,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Applies tool operations to the persisted graph.
#[derive(Debug, Clone)]
pub struct MutationEngine {
    store: Arc<GraphStore>,
}

impl MutationEngine {
    /// Create an engine over a shared store.
    #[must_use]
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Insert entities whose names are not already present.
    ///
    /// Repeated names within the batch keep the first occurrence. Duplicate
    /// observations inside a new entity are collapsed.
    pub fn create_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>, MemoryError> {
        let created = self.store.transact(|graph| {
            let mut created = Vec::new();
            for mut entity in entities {
                if graph.contains_entity(&entity.name) {
                    continue;
                }
                entity.observations = unique_in_order(entity.observations);
                graph.entities.push(entity.clone());
                created.push(entity);
            }
            Ok(created)
        })?;

        tracing::debug!(created = created.len(), "create_entities");
        Ok(created)
    }

    /// Insert relations whose triples are not already present.
    pub fn create_relations(&self, relations: Vec<Relation>) -> Result<Vec<Relation>, MemoryError> {
        let created = self.store.transact(|graph| {
            let mut created = Vec::new();
            for relation in relations {
                if graph.contains_relation(&relation) {
                    continue;
                }
                graph.relations.push(relation.clone());
                created.push(relation);
            }
            Ok(created)
        })?;

        tracing::debug!(created = created.len(), "create_relations");
        Ok(created)
    }

    /// Append new observations to existing entities.
    ///
    /// Fails with `NotFound` on the first unknown entity. In that case the
    /// file is left untouched, including additions for earlier entries.
    pub fn add_observations(
        &self,
        additions: Vec<ObservationAddition>,
    ) -> Result<Vec<AddedObservations>, MemoryError> {
        self.store.transact(|graph| {
            let mut results = Vec::with_capacity(additions.len());
            for addition in additions {
                let entity = graph
                    .entity_mut(&addition.entity_name)
                    .ok_or_else(|| MemoryError::NotFound(addition.entity_name.clone()))?;

                let mut added = Vec::new();
                for content in addition.contents {
                    if entity.has_observation(&content) {
                        continue;
                    }
                    entity.observations.push(content.clone());
                    added.push(content);
                }

                results.push(AddedObservations {
                    entity_name: addition.entity_name,
                    added_observations: added,
                });
            }
            Ok(results)
        })
    }

    /// Remove entities and every relation touching one of them.
    ///
    /// Unknown names are ignored.
    pub fn delete_entities(&self, names: Vec<String>) -> Result<(), MemoryError> {
        let doomed: BTreeSet<String> = names.into_iter().collect();
        self.store.transact(|graph| {
            graph.entities.retain(|e| !doomed.contains(&e.name));
            graph
                .relations
                .retain(|r| !doomed.contains(&r.from) && !doomed.contains(&r.to));
            Ok(())
        })
    }

    /// Remove listed observations. Unknown entities are skipped.
    pub fn delete_observations(
        &self,
        deletions: Vec<ObservationDeletion>,
    ) -> Result<(), MemoryError> {
        self.store.transact(|graph| {
            for deletion in &deletions {
                if let Some(entity) = graph.entity_mut(&deletion.entity_name) {
                    entity
                        .observations
                        .retain(|o| !deletion.observations.contains(o));
                }
            }
            Ok(())
        })
    }

    /// Remove relations matching a listed triple exactly.
    pub fn delete_relations(&self, relations: Vec<Relation>) -> Result<(), MemoryError> {
        self.store.transact(|graph| {
            graph
                .relations
                .retain(|r| !relations.iter().any(|d| d.same_triple(r)));
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The full graph.
    pub fn read_graph(&self) -> Result<KnowledgeGraph, MemoryError> {
        self.store.read(KnowledgeGraph::clone)
    }

    /// Case-insensitive substring search.
    pub fn search_nodes(&self, query: &str) -> Result<KnowledgeGraph, MemoryError> {
        self.store.read(|graph| query::search(graph, query))
    }

    /// Exact-name selection.
    pub fn open_nodes(&self, names: &[String]) -> Result<KnowledgeGraph, MemoryError> {
        self.store.read(|graph| query::open(graph, names))
    }

    /// Entity names in file order.
    pub fn entity_names(&self) -> Result<Vec<String>, MemoryError> {
        self.store.read(KnowledgeGraph::entity_names)
    }

    /// Graph counters.
    pub fn stats(&self) -> Result<GraphStats, MemoryError> {
        self.store.read(KnowledgeGraph::stats)
    }
}

fn unique_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
