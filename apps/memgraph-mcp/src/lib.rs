//! # memgraph-mcp
//!
//! MCP transport for memgraph: tools, topic resources and change
//! notifications over one local knowledge-graph store.

pub mod completion;
pub mod server;

pub use completion::{Completion, PeerCompletion, complete_within};
pub use server::{MemgraphMcp, SERVER_NAME};
