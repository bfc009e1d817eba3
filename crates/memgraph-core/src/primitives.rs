//! # Primitives
//!
//! Compiled-in constants for memgraph.
//!
//! These values fix the wire format, the resource addressing scheme and the
//! defaults used when no configuration overrides them.

/// Record discriminator for entity lines.
pub const ENTITY_RECORD: &str = "entity";

/// Record discriminator for relation lines.
pub const RELATION_RECORD: &str = "relation";

/// Default backing file name, relative to the working directory.
pub const DEFAULT_MEMORY_FILE: &str = "memory.jsonl";

/// Suffix appended to the backing file name for the atomic-replace scratch file.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

// =============================================================================
// RESOURCES
// =============================================================================

/// URI scheme for topic resources: `memory://<topic>`.
pub const RESOURCE_SCHEME: &str = "memory://";

/// Reserved topic that lists every entity name instead of generating text.
pub const ALL_TOPICS: &str = "all-topics";

/// MIME type of every resource body.
pub const RESOURCE_MIME_TYPE: &str = "text/plain";

// =============================================================================
// COMPLETION DEFAULTS
// =============================================================================

/// Default upper bound on generated tokens for a topic resource.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default timeout for a single completion call, in seconds.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Maximum size of a backing file the store will read (256 MB).
///
/// Larger files are treated as unreadable and handled by the load policy.
pub const MAX_MEMORY_FILE_SIZE: u64 = 256 * 1024 * 1024;
