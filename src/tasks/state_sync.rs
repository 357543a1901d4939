//! Periodic reconciliation against the shared record

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::TICK_INTERVAL;
use crate::state::AppState;

/// Poll once per second and, while this instance is in the foreground and
/// running, advance the shared record by the wall-clock time that passed.
pub async fn state_sync_task(state: Arc<AppState>) {
    info!("Starting state sync task");

    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if !state.is_visible() || !state.is_running() {
            continue;
        }

        if let Err(e) = state.reconcile_now() {
            warn!("Timer reconciliation failed: {}", e);
        }
    }
}
