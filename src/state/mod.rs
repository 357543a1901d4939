//! State management module
//!
//! This module contains the timer data model and the per-instance context
//! object that owns it.

pub mod app_state;
pub mod settings;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use settings::{SettingsOverride, TimerSettings};
pub use timer_state::{format_time, Position, TimerMode, TimerPhase, TimerSnapshot, TimerState};
