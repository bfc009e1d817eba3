//! # Graph Store
//!
//! Owns the backing file and translates between it and `KnowledgeGraph`.
//!
//! ## Persistence Model
//!
//! There is no incremental persistence and no dirty tracking. Every operation
//! reloads the whole graph from disk, and every mutation rewrites the whole
//! file. Writes go to a sibling scratch file which is synced and then renamed
//! over the target, so readers never observe a half-written file.
//!
//! ## Exclusion Region
//!
//! `read` and `transact` hold the store mutex across load (+ mutate + save).
//! Two concurrent mutations therefore serialize instead of losing updates.
//! Listeners run after the region is released.

use crate::config::MemoryConfig;
use crate::formats::{decode_graph, encode_graph};
use crate::notifier::{ChangeNotifier, SubscriptionId};
use crate::primitives::{MAX_MEMORY_FILE_SIZE, TEMP_FILE_SUFFIX};
use crate::{KnowledgeGraph, MemoryError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

// =============================================================================
// LOAD POLICY
// =============================================================================

/// What `load` does when the backing file exists but cannot be read or decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Log the error and continue with an empty graph.
    ///
    /// The next mutation overwrites the damaged file.
    #[default]
    #[serde(alias = "reset-to-empty", alias = "resettoempty")]
    Reset,
    /// Return `MemoryError::CorruptGraph` to the caller.
    Fail,
}

impl LoadPolicy {
    /// Configuration spelling of this policy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Fail => "fail",
        }
    }
}

impl FromStr for LoadPolicy {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset" | "reset-to-empty" | "resettoempty" => Ok(Self::Reset),
            "fail" => Ok(Self::Fail),
            other => Err(MemoryError::Config(format!(
                "unknown load policy '{}' (expected 'reset' or 'fail')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// GRAPH STORE
// =============================================================================

/// File-backed knowledge graph store.
#[derive(Debug)]
pub struct GraphStore {
    path: PathBuf,
    policy: LoadPolicy,
    region: Mutex<()>,
    notifier: ChangeNotifier,
}

impl GraphStore {
    /// Open a store at `path`.
    ///
    /// A leading `~/` is expanded from `$HOME`. The parent directory is created
    /// if missing. The file itself is not touched until the first save.
    pub fn open(path: impl AsRef<Path>, policy: LoadPolicy) -> Result<Self, MemoryError> {
        let path = expand_home(path.as_ref());

        if path.file_name().is_none() {
            return Err(MemoryError::Persistence(format!(
                "memory path '{}' has no file name",
                path.display()
            )));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Persistence(format!(
                    "cannot create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tracing::debug!(path = %path.display(), policy = %policy, "Opened graph store");

        Ok(Self {
            path,
            policy,
            region: Mutex::new(()),
            notifier: ChangeNotifier::new(),
        })
    }

    /// Open a store described by configuration.
    pub fn from_config(config: &MemoryConfig) -> Result<Self, MemoryError> {
        Self::open(&config.memory_path, config.on_corrupt_load)
    }

    /// The backing file path (after `~` expansion).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured load policy.
    #[must_use]
    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    /// The change notifier fired after every successful save.
    #[must_use]
    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Register a change listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Remove a change listener.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // -------------------------------------------------------------------------
    // Load / save
    // -------------------------------------------------------------------------

    /// Load the full graph.
    ///
    /// A missing file is an empty graph. Unreadable or malformed files follow
    /// the load policy.
    pub fn load(&self) -> Result<KnowledgeGraph, MemoryError> {
        let _region = self.region.lock().unwrap_or_else(|e| e.into_inner());
        self.load_unlocked()
    }

    /// Replace the backing file with `graph` and notify listeners.
    pub fn save(&self, graph: &KnowledgeGraph) -> Result<(), MemoryError> {
        {
            let _region = self.region.lock().unwrap_or_else(|e| e.into_inner());
            self.write_unlocked(graph)?;
        }
        self.notifier.notify();
        Ok(())
    }

    /// Run a query against a freshly loaded graph inside the exclusion region.
    pub fn read<T, F>(&self, query: F) -> Result<T, MemoryError>
    where
        F: FnOnce(&KnowledgeGraph) -> T,
    {
        let _region = self.region.lock().unwrap_or_else(|e| e.into_inner());
        let graph = self.load_unlocked()?;
        Ok(query(&graph))
    }

    /// Load, mutate and save inside the exclusion region.
    ///
    /// If `mutate` fails, nothing is written and no listener fires.
    pub fn transact<T, F>(&self, mutate: F) -> Result<T, MemoryError>
    where
        F: FnOnce(&mut KnowledgeGraph) -> Result<T, MemoryError>,
    {
        let outcome = {
            let _region = self.region.lock().unwrap_or_else(|e| e.into_inner());
            let mut graph = self.load_unlocked()?;
            let outcome = mutate(&mut graph)?;
            self.write_unlocked(&graph)?;
            outcome
        };
        self.notifier.notify();
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // File I/O (caller holds the region)
    // -------------------------------------------------------------------------

    fn load_unlocked(&self) -> Result<KnowledgeGraph, MemoryError> {
        match self.read_file() {
            Ok(mut graph) => {
                let dropped = graph.dedup();
                if dropped > 0 {
                    tracing::warn!(
                        path = %self.path.display(),
                        dropped,
                        "Dropped duplicate records while loading graph"
                    );
                }
                Ok(graph)
            }
            Err(e) => match self.policy {
                LoadPolicy::Reset => {
                    tracing::error!(
                        path = %self.path.display(),
                        "Error loading graph, continuing with an empty graph: {}",
                        e
                    );
                    Ok(KnowledgeGraph::new())
                }
                LoadPolicy::Fail => Err(e),
            },
        }
    }

    fn read_file(&self) -> Result<KnowledgeGraph, MemoryError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(KnowledgeGraph::new());
            }
            Err(e) => {
                return Err(MemoryError::CorruptGraph(format!(
                    "cannot stat '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if metadata.len() > MAX_MEMORY_FILE_SIZE {
            return Err(MemoryError::CorruptGraph(format!(
                "file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_MEMORY_FILE_SIZE
            )));
        }

        let text = fs::read_to_string(&self.path).map_err(|e| {
            MemoryError::CorruptGraph(format!("cannot read '{}': {}", self.path.display(), e))
        })?;

        decode_graph(&text)
    }

    fn write_unlocked(&self, graph: &KnowledgeGraph) -> Result<(), MemoryError> {
        let body = encode_graph(graph)?;
        let scratch = self.scratch_path();

        let written = fs::File::create(&scratch).and_then(|mut file| {
            file.write_all(body.as_bytes())?;
            file.sync_all()
        });
        let replaced = written.and_then(|()| fs::rename(&scratch, &self.path));

        if let Err(e) = replaced {
            let _ = fs::remove_file(&scratch);
            return Err(MemoryError::Persistence(format!(
                "cannot write '{}': {}",
                self.path.display(),
                e
            )));
        }

        tracing::debug!(
            path = %self.path.display(),
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            "Saved graph"
        );
        Ok(())
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(TEMP_FILE_SUFFIX);
        self.path.with_file_name(name)
    }
}

/// Expand a leading `~/` using `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    path.to_path_buf()
}

// =============================================================================
// TESTS
// =============================================================================
