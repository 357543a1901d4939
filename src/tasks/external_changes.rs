//! Adoption of timer records written by other instances

use std::sync::Arc;

use tracing::{info, warn};

use crate::state::AppState;

/// Adopt every external write to the shared timer record as it arrives.
///
/// Adoption is never written back, so two instances cannot echo a record
/// between each other indefinitely.
pub async fn external_change_task(state: Arc<AppState>) {
    info!("Starting external change task");

    let mut changes = state.store().changes();
    while let Some(external) = changes.recv().await {
        if let Err(e) = state.adopt_external(external) {
            warn!("Failed to adopt external timer state: {}", e);
        }
    }

    info!("Storage closed, external change task exiting");
}
