//! Background tasks module
//!
//! This module contains the recurring callbacks that drive one timer instance
//! alongside the HTTP server.

pub mod countdown;
pub mod external_changes;
pub mod file_watch;
pub mod state_sync;

use std::time::Duration;

/// Period of the countdown and reconciliation callbacks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// Re-export main functions
pub use countdown::countdown_task;
pub use external_changes::external_change_task;
pub use file_watch::file_watch_task;
pub use state_sync::state_sync_task;
