//! # memgraph-core
//!
//! The knowledge-graph persistence engine for memgraph - THE LOGIC.
//!
//! A graph of named entities, typed relations and free-text observations,
//! persisted as one line-delimited JSON file and exposed through a small
//! tool protocol.
//!
//! ## Layers
//!
//! - `types` / `formats`: value objects and the on-disk record encoding
//! - `store` / `notifier`: load/save with atomic replace, change listeners
//! - `query` / `mutation`: the nine graph operations
//! - `dispatch` / `resources`: tool catalogue, typed dispatch, topic prompts
//!
//! ## Architectural Constraints
//!
//! - Has NO async and NO network dependencies
//! - Every operation reloads the graph from disk inside the store's exclusion
//!   region; mutations rewrite the whole file
//! - Transports live in `apps/` and only talk to the `Dispatcher`

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod dispatch;
pub mod formats;
pub mod mutation;
pub mod notifier;
pub mod primitives;
pub mod query;
pub mod resources;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AddedObservations, Entity, GraphStats, KnowledgeGraph, MemoryError, ObservationAddition,
    ObservationDeletion, Relation,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use config::{CompletionConfig, MemoryConfig};
pub use mutation::MutationEngine;
pub use notifier::{ChangeListener, ChangeNotifier, SubscriptionId};
pub use store::{GraphStore, LoadPolicy};

// =============================================================================
// RE-EXPORTS: Protocol Surface
// =============================================================================

pub use dispatch::{Dispatcher, ToolArguments, ToolCall, ToolDescriptor, ToolKind, ToolOutput};
pub use resources::{CompletionRequest, ResourceBody, ResourceDescriptor, ResourceRequest};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{decode_graph, encode_graph};
