//! # Topic Resources
//!
//! Addressing and text preparation for `memory://<topic>` resources.
//!
//! Two kinds of topic exist:
//! - the sentinel `all-topics`, whose body is the list of entity names, one
//!   per line, produced without any text generation;
//! - every other topic, whose body is generated by a completion collaborator
//!   from a prompt built here.
//!
//! The collaborator itself lives in the transport. This module only decides
//! what to ask for (`ResourceBody::Generate`) or what to return directly
//! (`ResourceBody::Text`).

use crate::primitives::{ALL_TOPICS, RESOURCE_MIME_TYPE, RESOURCE_SCHEME};
use crate::{KnowledgeGraph, MemoryError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// =============================================================================
// ADDRESSING
// =============================================================================

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRequest {
    /// `memory://all-topics`
    AllTopics,
    /// `memory://<topic>`, percent-decoded.
    Topic(String),
}

impl ResourceRequest {
    /// Parse a `memory://` URI.
    ///
    /// A wrong scheme, an empty topic or invalid percent-encoding is an
    /// `InvalidRequest`.
    pub fn parse(uri: &str) -> Result<Self, MemoryError> {
        let raw = uri.strip_prefix(RESOURCE_SCHEME).ok_or_else(|| {
            MemoryError::InvalidRequest(format!(
                "Unsupported resource URI '{}': expected {}<topic>",
                uri, RESOURCE_SCHEME
            ))
        })?;

        let topic = percent_decode(raw)
            .ok_or_else(|| MemoryError::InvalidRequest(format!("Malformed resource URI '{}'", uri)))?;

        if topic.trim().is_empty() {
            return Err(MemoryError::InvalidRequest(format!(
                "Resource URI '{}' has no topic",
                uri
            )));
        }

        if topic == ALL_TOPICS {
            Ok(Self::AllTopics)
        } else {
            Ok(Self::Topic(topic))
        }
    }

    /// The canonical URI for this request.
    #[must_use]
    pub fn uri(&self) -> String {
        match self {
            Self::AllTopics => topic_uri(ALL_TOPICS),
            Self::Topic(topic) => topic_uri(topic),
        }
    }
}

/// Build `memory://<percent-encoded topic>`.
#[must_use]
pub fn topic_uri(topic: &str) -> String {
    format!("{}{}", RESOURCE_SCHEME, percent_encode(topic))
}

/// Encode every byte outside the RFC 3986 unreserved set.
fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
    }
    out
}

fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&byte) = bytes.get(i) {
        if byte == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(byte);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// =============================================================================
// CATALOGUE
// =============================================================================

/// One entry of the resource listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// The sentinel resource followed by one resource per entity name.
#[must_use]
pub fn catalogue(entity_names: &[String]) -> Vec<ResourceDescriptor> {
    let sentinel = ResourceDescriptor {
        uri: topic_uri(ALL_TOPICS),
        name: ALL_TOPICS.to_string(),
        description: "Names of every entity in the knowledge graph".to_string(),
        mime_type: RESOURCE_MIME_TYPE.to_string(),
    };

    std::iter::once(sentinel)
        .chain(entity_names.iter().map(|name| ResourceDescriptor {
            uri: topic_uri(name),
            name: name.clone(),
            description: format!("Generated text about '{}'", name),
            mime_type: RESOURCE_MIME_TYPE.to_string(),
        }))
        .collect()
}

// =============================================================================
// PROMPTS
// =============================================================================

/// Input for the completion collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    /// Opaque to the core; forwarded as-is.
    pub metadata: serde_json::Value,
}

/// What reading a resource requires.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceBody {
    /// The body is ready.
    Text(String),
    /// The body must be generated from this request.
    Generate(CompletionRequest),
}

/// Render the entity names for the sentinel topic.
#[must_use]
pub fn render_topic_list(entity_names: &[String]) -> String {
    entity_names.join("\n")
}

/// Render a search result as a plain-text context block.
///
/// ```text
/// Entities:
/// - Paris (City)
///   - capital of France
/// Relations:
/// - Paris --capital_of--> France
/// ```
#[must_use]
pub fn render_context(graph: &KnowledgeGraph) -> String {
    let mut out = String::from("Entities:\n");
    for entity in &graph.entities {
        let _ = writeln!(out, "- {} ({})", entity.name, entity.entity_type);
        for observation in &entity.observations {
            let _ = writeln!(out, "  - {}", observation);
        }
    }

    if !graph.relations.is_empty() {
        out.push_str("Relations:\n");
        for relation in &graph.relations {
            let _ = writeln!(
                out,
                "- {} --{}--> {}",
                relation.from, relation.relation_type, relation.to
            );
        }
    }

    out.truncate(out.trim_end().len());
    out
}

/// Build the generation prompt for a topic.
///
/// With `context`, the prompt embeds it and asks for text grounded in it.
/// Without, the generic prompt is used.
#[must_use]
pub fn build_prompt(topic: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "Write a concise, well-organized text about \"{topic}\".\n\
             Base it on the following knowledge graph excerpt and do not invent \
             facts that contradict it.\n\n\
             {context}"
        ),
        None => format!(
            "Write a concise, well-organized text about \"{topic}\".\n\
             The knowledge graph holds no entries for this topic."
        ),
    }
}

/// Decide how to answer a topic read given the current search result.
#[must_use]
pub fn prepare_topic(topic: &str, matches: &KnowledgeGraph, max_tokens: u32) -> CompletionRequest {
    let context = (!matches.entities.is_empty()).then(|| render_context(matches));
    CompletionRequest {
        prompt: build_prompt(topic, context.as_deref()),
        max_tokens,
        metadata: serde_json::json!({
            "topic": topic,
            "matchedEntities": matches.entities.len(),
        }),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, Relation};

    #[test]
    fn parse_sentinel_and_topic() {
        assert_eq!(
            ResourceRequest::parse("memory://all-topics").expect("parse"),
            ResourceRequest::AllTopics
        );
        assert_eq!(
            ResourceRequest::parse("memory://Paris").expect("parse"),
            ResourceRequest::Topic("Paris".into())
        );
    }

    #[test]
    fn parse_decodes_percent_escapes() {
        assert_eq!(
            ResourceRequest::parse("memory://New%20York").expect("parse"),
            ResourceRequest::Topic("New York".into())
        );
        assert_eq!(
            ResourceRequest::parse("memory://%E8%8D%89%E5%9B%BE").expect("parse"),
            ResourceRequest::Topic("草图".into())
        );
    }

    #[test]
    fn parse_rejects_bad_uris() {
        for uri in [
            "http://Paris",
            "memory://",
            "memory://%20",
            "memory://%zz",
            "memory://a%+Ab",
            "memory://%-1",
            "Paris",
        ] {
            let err = ResourceRequest::parse(uri).expect_err(uri);
            assert!(matches!(err, MemoryError::InvalidRequest(_)), "{uri}");
        }
    }

    #[test]
    fn topic_uri_roundtrips_through_parse() {
        for topic in ["New York", "a/b?c#d", "草图", "100%"] {
            let uri = topic_uri(topic);
            assert_eq!(
                ResourceRequest::parse(&uri).expect("parse"),
                ResourceRequest::Topic(topic.to_string())
            );
        }
    }

    #[test]
    fn catalogue_starts_with_sentinel() {
        let resources = catalogue(&["Paris".to_string(), "New York".to_string()]);
        let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec!["memory://all-topics", "memory://Paris", "memory://New%20York"]
        );
        assert!(resources.iter().all(|r| r.mime_type == "text/plain"));
    }

    #[test]
    fn context_lists_entities_then_relations() {
        let graph = KnowledgeGraph::with_data(
            vec![
                Entity::new("Paris", "City", vec!["capital of France".into()]),
                Entity::new("France", "Country", vec![]),
            ],
            vec![Relation::new("Paris", "France", "capital_of")],
        );

        assert_eq!(
            render_context(&graph),
            "Entities:\n\
             - Paris (City)\n  - capital of France\n\
             - France (Country)\n\
             Relations:\n\
             - Paris --capital_of--> France"
        );
    }

    #[test]
    fn prompt_embeds_context_only_when_matches_exist() {
        let matches = KnowledgeGraph::with_data(vec![Entity::new("Paris", "City", vec![])], vec![]);
        let with = prepare_topic("paris", &matches, 500);
        assert!(with.prompt.contains("\"paris\""));
        assert!(with.prompt.contains("- Paris (City)"));
        assert_eq!(with.max_tokens, 500);
        assert_eq!(with.metadata["matchedEntities"], 1);

        let without = prepare_topic("tokyo", &KnowledgeGraph::new(), 500);
        assert!(without.prompt.contains("\"tokyo\""));
        assert!(!without.prompt.contains("Entities:"));
    }

    #[test]
    fn topic_list_is_one_name_per_line() {
        let names = vec!["A".to_string(), "B".to_string()];
        assert_eq!(render_topic_list(&names), "A\nB");
        assert_eq!(render_topic_list(&[]), "");
    }
}
