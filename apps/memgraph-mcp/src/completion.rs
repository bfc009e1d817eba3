//! # Completion
//!
//! Text generation for topic resources.
//!
//! The server never talks to a model itself. It asks the connected MCP client
//! to sample a message (`sampling/createMessage`) and returns the text of the
//! reply unchanged.

use memgraph_core::{CompletionRequest, MemoryError};
use rmcp::RoleServer;
use rmcp::model::{Content, ContextInclusion, CreateMessageRequestParam, Role, SamplingMessage};
use rmcp::service::Peer;
use std::future::Future;
use std::time::Duration;

/// A text-generation collaborator.
pub trait Completion: Send + Sync {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<String, MemoryError>> + Send;
}

/// Run a completion bounded by `limit`.
pub async fn complete_within<C: Completion>(
    completion: &C,
    request: CompletionRequest,
    limit: Duration,
) -> Result<String, MemoryError> {
    match tokio::time::timeout(limit, completion.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(MemoryError::Completion(format!(
            "no reply within {} ms",
            limit.as_millis()
        ))),
    }
}

// =============================================================================
// CLIENT SAMPLING
// =============================================================================

/// Completion backed by the MCP client's sampling capability.
#[derive(Clone)]
pub struct PeerCompletion {
    peer: Peer<RoleServer>,
}

impl PeerCompletion {
    pub fn new(peer: Peer<RoleServer>) -> Self {
        Self { peer }
    }
}

impl Completion for PeerCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, MemoryError> {
        let result = self
            .peer
            .create_message(sampling_params(request))
            .await
            .map_err(|e| MemoryError::Completion(e.to_string()))?;

        reply_text(&result.message.content)
            .ok_or_else(|| MemoryError::Completion("sampling reply carried no text".to_string()))
    }
}

/// A single user turn carrying the prompt, no server context.
fn sampling_params(request: CompletionRequest) -> CreateMessageRequestParam {
    CreateMessageRequestParam {
        messages: vec![SamplingMessage {
            role: Role::User,
            content: Content::text(request.prompt),
        }],
        model_preferences: None,
        system_prompt: None,
        include_context: Some(ContextInclusion::None),
        temperature: None,
        max_tokens: request.max_tokens,
        stop_sequences: None,
        metadata: Some(request.metadata),
    }
}

/// Text of a sampling reply; non-text content is no answer.
fn reply_text(content: &Content) -> Option<String> {
    content.as_text().map(|text| text.text.clone())
}

// =============================================================================
// TESTS
// =============================================================================
