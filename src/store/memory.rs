//! In-process shared store

use std::{collections::HashMap, sync::Mutex};

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::{InstanceId, KeyValueStore, StorageEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::StoreError;

/// Key/value store held in memory and shared by every instance that holds a
/// handle to it
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str, source: InstanceId) -> Result<(), StoreError> {
        let previous = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            entries.insert(key.to_string(), value.to_string())
        };

        if previous.as_deref() == Some(value) {
            trace!("{} rewritten with identical value", key);
            return Ok(());
        }

        // No subscribers is not an error.
        if self
            .events
            .send(StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                source: Some(source),
            })
            .is_err()
        {
            debug!("No listeners for change of {}", key);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v", InstanceId::new()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn overwrite_notifies_with_source() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        let writer = InstanceId::new();

        store.set("timer_state", "{}", writer).unwrap();
        let event = rx.recv().await.unwrap();

        assert_eq!(event.key, "timer_state");
        assert_eq!(event.new_value.as_deref(), Some("{}"));
        assert_eq!(event.source, Some(writer));
    }

    #[tokio::test]
    async fn identical_value_does_not_notify() {
        let store = MemoryStore::new();
        let writer = InstanceId::new();
        store.set("k", "same", writer).unwrap();

        let mut rx = store.subscribe();
        store.set("k", "same", writer).unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
