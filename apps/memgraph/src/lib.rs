//! # memgraph
//!
//! REST bridge and CLI over `memgraph-core`.
//!
//! The HTTP routes and the CLI commands both drive the same
//! [`memgraph_core::Dispatcher`], so a tool called over HTTP behaves exactly
//! like one called from the MCP server.

pub mod api;
pub mod cli;
