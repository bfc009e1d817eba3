//! # Write Guard
//!
//! Protection for the mutating half of the tool protocol.
//!
//! `GET` routes and the read-only tools (`read_graph`, `search_nodes`,
//! `open_nodes`) are always open. A mutating tool call rewrites the whole
//! backing file under the store's lock, so those calls can be restricted:
//!
//! - `MEMGRAPH_API_KEY`: when set, mutating calls need `Authorization: Bearer <key>`
//! - `MEMGRAPH_WRITE_RATE`: mutating calls per second (default 50, 0 disables)

use axum::http::StatusCode;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use memgraph_core::ToolKind;
use std::num::NonZeroU32;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Environment variable holding the shared key for mutating calls.
pub const ENV_API_KEY: &str = "MEMGRAPH_API_KEY";
/// Environment variable holding the write budget per second.
pub const ENV_WRITE_RATE: &str = "MEMGRAPH_WRITE_RATE";

const DEFAULT_WRITES_PER_SECOND: u32 = 50;

type WriteLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Why a mutating call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// Missing or wrong key.
    Unauthorized,
    /// Write budget exhausted for this second.
    Throttled,
}

impl GuardRejection {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Throttled => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Unauthorized => "Mutating tools require a valid API key",
            Self::Throttled => "Too many graph writes, retry shortly",
        }
    }
}

/// Key check and write budget applied to mutating tool calls.
///
/// The default guard lets everything through.
#[derive(Clone, Default)]
pub struct WriteGuard {
    api_key: Option<Arc<str>>,
    limiter: Option<Arc<WriteLimiter>>,
}

impl WriteGuard {
    /// Require `key` for mutating calls. An empty key disables the check.
    #[must_use]
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = (!key.is_empty()).then(|| Arc::from(key));
        self
    }

    /// Allow at most `per_second` mutating calls per second. 0 disables the budget.
    #[must_use]
    pub fn with_write_rate(mut self, per_second: u32) -> Self {
        self.limiter = NonZeroU32::new(per_second)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        self
    }

    /// Build from `MEMGRAPH_API_KEY` and `MEMGRAPH_WRITE_RATE`.
    pub fn from_env() -> Self {
        let key = std::env::var(ENV_API_KEY).unwrap_or_default();
        let rate = match std::env::var(ENV_WRITE_RATE) {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "{}='{}' is not a number, using {}",
                    ENV_WRITE_RATE,
                    raw,
                    DEFAULT_WRITES_PER_SECOND
                );
                DEFAULT_WRITES_PER_SECOND
            }),
            Err(_) => DEFAULT_WRITES_PER_SECOND,
        };
        Self::default().with_api_key(&key).with_write_rate(rate)
    }

    pub fn requires_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn limits_writes(&self) -> bool {
        self.limiter.is_some()
    }

    /// Admit or refuse a call to `tool`.
    ///
    /// Read-only tools always pass. The key is checked before the budget so
    /// refused callers never spend it.
    pub fn check(&self, tool: ToolKind, authorization: Option<&str>) -> Result<(), GuardRejection> {
        if !tool.is_mutation() {
            return Ok(());
        }

        if let Some(expected) = &self.api_key {
            let presented = authorization
                .and_then(|value| value.strip_prefix("Bearer "))
                .unwrap_or_default();
            let matches: bool = presented.as_bytes().ct_eq(expected.as_bytes()).into();
            if !matches {
                tracing::warn!(tool = %tool, "Refused mutating call: bad or missing key");
                return Err(GuardRejection::Unauthorized);
            }
        }

        if let Some(limiter) = &self.limiter
            && limiter.check().is_err()
        {
            tracing::warn!(tool = %tool, "Refused mutating call: write budget exhausted");
            return Err(GuardRejection::Throttled);
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
