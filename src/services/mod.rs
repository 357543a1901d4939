//! External side-effect module
//!
//! This module contains the completion notification and alarm playback that
//! fire when a countdown reaches zero.

pub mod notifier;

// Re-export main items
pub use notifier::{CompletionNotifier, NotificationPermission, SystemNotifier};
