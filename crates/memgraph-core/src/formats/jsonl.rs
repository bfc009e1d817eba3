//! # Line-Delimited Record Format
//!
//! One JSON object per line, two record shapes:
//!
//! ```text
//! {"type":"entity","name":"Paris","entityType":"City","observations":["capital"]}
//! {"type":"relation","from":"Paris","to":"France","relationType":"capital_of"}
//! ```
//!
//! Entities are written before relations. Lines are joined with `\n`, with no
//! enclosing array and no trailing newline. Each line decodes on its own, so a
//! damaged tail does not hide the records before it.

use crate::primitives::{ENTITY_RECORD, RELATION_RECORD};
use crate::{Entity, KnowledgeGraph, MemoryError, Relation};
use serde::{Deserialize, Serialize};

/// A single persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Entity(Entity),
    Relation(Relation),
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode one record as a compact JSON line (no newline).
pub fn encode_record(record: &Record) -> Result<String, MemoryError> {
    serde_json::to_string(record).map_err(|e| MemoryError::Persistence(e.to_string()))
}

/// Encode a whole graph: every entity, then every relation.
///
/// This is a pure transformation - no file I/O.
pub fn encode_graph(graph: &KnowledgeGraph) -> Result<String, MemoryError> {
    let mut lines = Vec::with_capacity(graph.entities.len() + graph.relations.len());

    for entity in &graph.entities {
        lines.push(encode_record(&Record::Entity(entity.clone()))?);
    }
    for relation in &graph.relations {
        lines.push(encode_record(&Record::Relation(relation.clone()))?);
    }

    Ok(lines.join("\n"))
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode one non-blank line.
///
/// Returns `Ok(None)` for well-formed records whose `type` is neither
/// `entity` nor `relation`; those are skipped rather than rejected.
pub fn decode_line(line: &str) -> Result<Option<Record>, String> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(|e| e.to_string())?;

    let kind = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "record has no string \"type\" field".to_string())?;

    match kind {
        ENTITY_RECORD | RELATION_RECORD => serde_json::from_value::<Record>(value)
            .map(Some)
            .map_err(|e| e.to_string()),
        other => {
            tracing::debug!(record_type = other, "Skipping record of unknown type");
            Ok(None)
        }
    }
}

/// Decode a whole file body.
///
/// Blank lines are ignored. A leading byte-order mark is stripped. The first
/// malformed line aborts decoding with `CorruptGraph` naming its 1-based
/// line number.
///
/// This is a pure transformation - no file I/O.
pub fn decode_graph(text: &str) -> Result<KnowledgeGraph, MemoryError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut graph = KnowledgeGraph::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode_line(line) {
            Ok(Some(Record::Entity(entity))) => graph.entities.push(entity),
            Ok(Some(Record::Relation(relation))) => graph.relations.push(relation),
            Ok(None) => {}
            Err(e) => {
                return Err(MemoryError::CorruptGraph(format!(
                    "line {}: {}",
                    index + 1,
                    e
                )));
            }
        }
    }

    Ok(graph)
}

// =============================================================================
// TESTS
// =============================================================================
