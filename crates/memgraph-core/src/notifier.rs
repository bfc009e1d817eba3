//! # Change Notifier
//!
//! Observer list owned by the `GraphStore`.
//!
//! Every successful save fires every registered listener, in registration
//! order, with no arguments. Listener failures never reach the save path:
//! an `Err` is logged at `warn`, a panic is caught and logged at `error`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

/// A change listener.
///
/// Typical listeners schedule an asynchronous "resources changed" push on the
/// owning session and return immediately.
pub type ChangeListener = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Handle returned by `subscribe`, used to remove a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, ChangeListener)>,
}

/// Registry of change listeners.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Mutex<Listeners>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ChangeNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id = listeners.next_id.saturating_add(1);
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry_id, _)| *entry_id != id);
        listeners.entries.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    /// Check if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener.
    ///
    /// The listener list is snapshotted first, so a listener may subscribe or
    /// unsubscribe without deadlocking.
    pub fn notify(&self) {
        let snapshot: Vec<(SubscriptionId, ChangeListener)> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .clone();

        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(subscription = id.0, "Change listener failed: {}", e);
                }
                Err(_) => {
                    tracing::error!(subscription = id.0, "Change listener panicked");
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
