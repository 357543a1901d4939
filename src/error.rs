//! Error types shared across the crate

use thiserror::Error;

use crate::state::TimerMode;

/// Errors returned by timer operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    /// `start` was requested on a timer that has already run out
    #[error("cannot start the {0} timer with no time left")]
    NothingToStart(TimerMode),

    #[error("unknown timer mode: {0}")]
    UnknownMode(String),

    #[error("failed to lock {what}: {reason}")]
    StateLock { what: &'static str, reason: String },
}

impl TimerError {
    pub(crate) fn lock<E: std::fmt::Display>(what: &'static str, err: E) -> Self {
        TimerError::StateLock {
            what,
            reason: err.to_string(),
        }
    }
}

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}
