//! TaskWise Timer - a pomodoro countdown kept consistent across instances
//!
//! Every running instance keeps its own countdown loop and working copy of the
//! timer, persists each change to a shared key/value store, adopts the writes
//! of other instances, and reconciles against wall-clock time so suspended or
//! backgrounded instances never lose elapsed time.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{StoreError, TimerError};
pub use state::{AppState, TimerMode, TimerSettings, TimerSnapshot, TimerState};
pub use utils::signals::shutdown_signal;
