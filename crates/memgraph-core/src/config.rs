//! # Configuration
//!
//! Shared settings for both binaries.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. TOML file (`--config <path>`)
//! 3. Environment variables
//! 4. Command-line flags (applied by the apps)
//!
//! ```toml
//! memory_path = "~/.memgraph/memory.jsonl"
//! on_corrupt_load = "fail"
//!
//! [completion]
//! timeout_secs = 30
//! max_tokens = 800
//! ```

use crate::MemoryError;
use crate::primitives::{DEFAULT_COMPLETION_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_MEMORY_FILE};
use crate::store::LoadPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `memory_path`.
pub const ENV_MEMORY_PATH: &str = "MEMGRAPH_MEMORY_PATH";
/// Environment variable overriding `on_corrupt_load`.
pub const ENV_ON_CORRUPT_LOAD: &str = "MEMGRAPH_ON_CORRUPT_LOAD";
/// Environment variable overriding `completion.timeout_secs`.
pub const ENV_COMPLETION_TIMEOUT: &str = "MEMGRAPH_COMPLETION_TIMEOUT";
/// Environment variable overriding `completion.max_tokens`.
pub const ENV_COMPLETION_MAX_TOKENS: &str = "MEMGRAPH_COMPLETION_MAX_TOKENS";

/// Settings for the completion collaborator used by topic resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_COMPLETION_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub memory_path: PathBuf,
    pub on_corrupt_load: LoadPolicy,
    pub completion: CompletionConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_path: PathBuf::from(DEFAULT_MEMORY_FILE),
            on_corrupt_load: LoadPolicy::default(),
            completion: CompletionConfig::default(),
        }
    }
}

impl MemoryConfig {
    /// Parse configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, MemoryError> {
        toml::from_str(text).map_err(|e| MemoryError::Config(e.to_string()))
    }

    /// Read configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MemoryError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load defaults, then the optional file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, MemoryError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `MEMGRAPH_*` environment variables.
    ///
    /// Empty values are ignored. Unparsable values are configuration errors.
    pub fn apply_env_overrides(&mut self) -> Result<(), MemoryError> {
        if let Some(value) = non_empty_env(ENV_MEMORY_PATH) {
            self.memory_path = PathBuf::from(value);
        }
        if let Some(value) = non_empty_env(ENV_ON_CORRUPT_LOAD) {
            self.on_corrupt_load = value.parse()?;
        }
        if let Some(value) = non_empty_env(ENV_COMPLETION_TIMEOUT) {
            self.completion.timeout_secs = parse_number(ENV_COMPLETION_TIMEOUT, &value)?;
        }
        if let Some(value) = non_empty_env(ENV_COMPLETION_MAX_TOKENS) {
            self.completion.max_tokens = parse_number(ENV_COMPLETION_MAX_TOKENS, &value)?;
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, MemoryError> {
    value
        .trim()
        .parse()
        .map_err(|_| MemoryError::Config(format!("{} must be a number, got '{}'", key, value)))
}

// =============================================================================
// TESTS
// =============================================================================
