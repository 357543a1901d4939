//! Typed access to the shared timer keys

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::{InstanceId, KeyValueStore, StorageEvent, TIMER_SETTINGS_KEY, TIMER_STATE_KEY};
use crate::{
    engine::machine,
    error::StoreError,
    state::{SettingsOverride, TimerSettings, TimerState},
};

/// Timer persistence as seen by one instance.
///
/// Reads never fail: missing or malformed records fall back to defaults.
#[derive(Clone)]
pub struct TimerStore {
    kv: Arc<dyn KeyValueStore>,
    instance: InstanceId,
}

impl TimerStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, instance: InstanceId) -> Self {
        Self { kv, instance }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Stored partial override, or an empty one
    pub fn load_settings_override(&self) -> SettingsOverride {
        self.read_json(TIMER_SETTINGS_KEY).unwrap_or_default()
    }

    /// Defaults with the stored override merged on top
    pub fn load_settings(&self) -> TimerSettings {
        TimerSettings::default().merged(&self.load_settings_override())
    }

    pub fn save_settings_override(&self, overrides: &SettingsOverride) -> Result<(), StoreError> {
        let json = serde_json::to_string(overrides)?;
        self.kv.set(TIMER_SETTINGS_KEY, &json, self.instance)
    }

    /// Current shared record exactly as persisted
    pub fn read_persisted(&self) -> Option<TimerState> {
        self.read_json(TIMER_STATE_KEY)
    }

    /// Working state for a cold start: the shared record, halted and stamped,
    /// or a fresh default
    pub fn load_state(&self, settings: &TimerSettings, now_ms: i64) -> TimerState {
        machine::hydrate(self.read_persisted(), settings, now_ms)
    }

    pub fn save_state(&self, state: &TimerState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.kv.set(TIMER_STATE_KEY, &json, self.instance)
    }

    /// Subscribe to timer records written by other instances
    pub fn changes(&self) -> StateChanges {
        StateChanges {
            rx: self.kv.subscribe(),
            instance: self.instance,
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed {} record: {}", key, e);
                None
            }
        }
    }
}

/// Typed change-notification channel for the shared timer record.
///
/// Yields only `timer_state` writes that did not originate from the owning
/// instance. Malformed payloads and removals are skipped.
pub struct StateChanges {
    rx: broadcast::Receiver<StorageEvent>,
    instance: InstanceId,
}

impl StateChanges {
    /// Next external timer record, or `None` once the store is gone
    pub async fn recv(&mut self) -> Option<TimerState> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if let Some(state) = self.accept(event) {
                        return Some(state);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} storage events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn accept(&self, event: StorageEvent) -> Option<TimerState> {
        if event.key != TIMER_STATE_KEY || event.source == Some(self.instance) {
            return None;
        }

        let raw = event.new_value?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("Skipping malformed external timer record: {}", e);
                None
            }
        }
    }
}
