//! Detection of writes made by other processes sharing a `FileStore`

use std::{sync::Arc, time::Duration};

use tokio::time::interval;
use tracing::{info, warn};

use crate::store::{FileStore, TIMER_STATE_KEY};

/// How often the storage directory is checked for foreign writes
pub const FILE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll the shared timer record and turn foreign writes into storage events.
///
/// Settings are read when an instance starts or updates them, so only the
/// timer record is watched.
pub async fn file_watch_task(store: Arc<FileStore>) {
    info!("Starting file watch task on {}", store.dir().display());

    let mut ticker = interval(FILE_POLL_INTERVAL);
    loop {
        ticker.tick().await;

        if let Err(e) = store.poll_external_change(TIMER_STATE_KEY) {
            warn!("Failed to check {} for changes: {}", TIMER_STATE_KEY, e);
        }
    }
}
