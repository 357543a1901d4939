//! Directory-backed store shared between processes.
//!
//! Each key lives in `<dir>/<key>.json`. Writes go to a temporary file in the
//! same directory and are renamed into place, so readers never observe a
//! partial record. Writes made by other processes are picked up by polling
//! ([`FileStore::poll_external_change`]), since the filesystem offers no
//! equivalent of a storage event.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use super::{InstanceId, KeyValueStore, StorageEvent, EVENT_CHANNEL_CAPACITY};
use crate::error::StoreError;

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Last content written or observed per key; `None` means the file was absent.
    /// Locked across each write and each poll.
    seen: Mutex<HashMap<String, Option<String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        info!("Using timer storage at {}", dir.display());

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            dir,
            seen: Mutex::new(HashMap::new()),
            events,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read_file(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn write_atomic(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        let io_err = |p: &Path| {
            let p = p.display().to_string();
            move |source: std::io::Error| StoreError::Io { path: p, source }
        };

        let mut tmp = File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        tmp.write_all(value.as_bytes()).map_err(io_err(&tmp_path))?;
        tmp.sync_all().map_err(io_err(&tmp_path))?;
        drop(tmp);

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(&path)(e));
        }
        Ok(())
    }

    fn seen(&self) -> Result<MutexGuard<'_, HashMap<String, Option<String>>>, StoreError> {
        self.seen
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    /// Check whether `key` was rewritten by someone else since this store last
    /// wrote or observed it, broadcasting and returning the change if so.
    ///
    /// The first poll of a key only records a baseline.
    pub fn poll_external_change(&self, key: &str) -> Result<Option<StorageEvent>, StoreError> {
        let mut seen = self.seen()?;
        let current = self.read_file(key)?;
        let previous = seen.insert(key.to_string(), current.clone());
        drop(seen);

        match previous {
            None => Ok(None),
            Some(previous) if previous == current => Ok(None),
            Some(_) => {
                debug!("Detected external write to {}", key);
                let event = StorageEvent {
                    key: key.to_string(),
                    new_value: current,
                    source: None,
                };
                let _ = self.events.send(event.clone());
                Ok(Some(event))
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read_file(key)
    }

    fn set(&self, key: &str, value: &str, source: InstanceId) -> Result<(), StoreError> {
        let mut seen = self.seen()?;
        self.write_atomic(key, value)?;
        let previous = seen.insert(key.to_string(), Some(value.to_string()));
        drop(seen);

        if previous.flatten().as_deref() != Some(value) {
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                source: Some(source),
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
