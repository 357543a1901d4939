//! Persistence module
//!
//! A small key/value abstraction shared by every timer instance, the change
//! events it broadcasts, and the typed timer facade built on top of it.

pub mod file;
pub mod memory;
pub mod timer_store;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::StoreError;

// Re-export main types
pub use file::FileStore;
pub use memory::MemoryStore;
pub use timer_store::{StateChanges, TimerStore};

/// Key holding the shared `TimerState` record
pub const TIMER_STATE_KEY: &str = "timer_state";
/// Key holding the user's partial `TimerSettings` override
pub const TIMER_SETTINGS_KEY: &str = "timer_settings";

/// Capacity of the change broadcast channel of every store
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identity of one running timer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fired to every subscriber when a key is overwritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// Serialized value after the write; `None` when the key was removed
    pub new_value: Option<String>,
    /// Writer of the value, when it is known to this process
    pub source: Option<InstanceId>,
}

/// Origin-scoped key/value storage shared by cooperating instances.
///
/// Access is read-modify-write without locking; the last writer wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite `key`, notifying subscribers when the value actually changed
    fn set(&self, key: &str, value: &str, source: InstanceId) -> Result<(), StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}
