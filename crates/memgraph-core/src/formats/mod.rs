//! # Formats Module
//!
//! Serialization formats for memgraph.
//!
//! The store only does file I/O; the text encoding of a graph lives here.

pub mod jsonl;

pub use jsonl::{Record, decode_graph, decode_line, encode_graph, encode_record};
