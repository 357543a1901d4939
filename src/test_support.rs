//! Shared helpers for unit tests

use std::sync::Mutex;

use crate::{services::CompletionNotifier, state::TimerMode};

/// Notifier that records every completion it is told about
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    completed: Mutex<Vec<TimerMode>>,
}

impl RecordingNotifier {
    pub fn completions(&self) -> Vec<TimerMode> {
        self.completed.lock().unwrap().clone()
    }
}

impl CompletionNotifier for RecordingNotifier {
    fn notify_complete(&self, mode: TimerMode) {
        self.completed.lock().unwrap().push(mode);
    }
}

/// Wall clock that follows tokio's (possibly paused) timer, so tests that
/// advance virtual time move both the loops and the timestamps together
#[derive(Debug)]
pub struct TokioClock {
    base_ms: i64,
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            base_ms: 1_700_000_000_000,
            start: tokio::time::Instant::now(),
        }
    }
}

impl crate::utils::Clock for TokioClock {
    fn now_ms(&self) -> i64 {
        self.base_ms + self.start.elapsed().as_millis() as i64
    }
}
