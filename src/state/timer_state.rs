//! Timer state structure and its persisted wire shape

use serde::{Deserialize, Serialize};

use super::TimerSettings;

/// Duration bucket the countdown is running against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Focus, TimerMode::ShortBreak, TimerMode::LongBreak];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }

    /// Parse a mode name as used in URLs and persisted JSON
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "focus" => Some(TimerMode::Focus),
            "short_break" => Some(TimerMode::ShortBreak),
            "long_break" => Some(TimerMode::LongBreak),
            _ => None,
        }
    }
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::Focus
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the countdown is decrementing, halted, or halted at zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Paused,
    Running,
    Completed,
}

/// UI-only pixel coordinates of the floating widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// The single shared timer record.
///
/// Persisted under `timer_state` with camelCase keys. The phase is not stored
/// directly; it is rebuilt from `isRunning` and `timeLeftSeconds` on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PersistedTimerState", into = "PersistedTimerState")]
pub struct TimerState {
    pub mode: TimerMode,
    pub time_left_seconds: u64,
    pub phase: TimerPhase,
    pub is_minimized: bool,
    pub position: Option<Position>,
    /// Wall-clock time at which `time_left_seconds` was last known accurate
    pub last_update_epoch_ms: i64,
}

impl TimerState {
    /// Fresh paused state for the given mode
    pub fn new(mode: TimerMode, settings: &TimerSettings, now_ms: i64) -> Self {
        Self {
            mode,
            time_left_seconds: settings.duration_for(mode),
            phase: TimerPhase::Paused,
            is_minimized: false,
            position: None,
            last_update_epoch_ms: now_ms,
        }
    }

    /// Default first-load state: focus mode, full duration, paused
    pub fn initial(settings: &TimerSettings, now_ms: i64) -> Self {
        Self::new(TimerMode::Focus, settings, now_ms)
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_completed(&self) -> bool {
        self.phase == TimerPhase::Completed
    }

    /// Remaining time rendered as `MM:SS`
    pub fn display(&self) -> String {
        format_time(self.time_left_seconds)
    }

    /// Label of the primary control the presentation layer should show
    pub fn action_label(&self) -> &'static str {
        match self.phase {
            TimerPhase::Running => "Pause",
            TimerPhase::Paused => "Start",
            TimerPhase::Completed => "Restart",
        }
    }

    /// Phase implied by a halted timer with the current remaining time
    pub(crate) fn halted_phase(&self) -> TimerPhase {
        if self.time_left_seconds == 0 {
            TimerPhase::Completed
        } else {
            TimerPhase::Paused
        }
    }
}

/// Format seconds as zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// JSON shape shared with every other instance reading the same key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTimerState {
    #[serde(default)]
    mode: TimerMode,
    time_left_seconds: u64,
    #[serde(default)]
    is_running: bool,
    #[serde(default)]
    is_minimized: bool,
    #[serde(default)]
    position: Option<Position>,
    last_update_epoch_ms: i64,
}

impl From<PersistedTimerState> for TimerState {
    fn from(p: PersistedTimerState) -> Self {
        // A zero timer is never running, whatever the record claims.
        let phase = if p.time_left_seconds == 0 {
            TimerPhase::Completed
        } else if p.is_running {
            TimerPhase::Running
        } else {
            TimerPhase::Paused
        };

        Self {
            mode: p.mode,
            time_left_seconds: p.time_left_seconds,
            phase,
            is_minimized: p.is_minimized,
            position: p.position,
            last_update_epoch_ms: p.last_update_epoch_ms,
        }
    }
}

impl From<TimerState> for PersistedTimerState {
    fn from(s: TimerState) -> Self {
        Self {
            mode: s.mode,
            time_left_seconds: s.time_left_seconds,
            is_running: s.is_running(),
            is_minimized: s.is_minimized,
            position: s.position,
            last_update_epoch_ms: s.last_update_epoch_ms,
        }
    }
}

/// Presentation view of the timer handed to the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub phase: TimerPhase,
    pub is_running: bool,
    pub time_left_seconds: u64,
    pub display: String,
    pub action_label: String,
    pub is_minimized: bool,
    pub position: Option<Position>,
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            mode: state.mode,
            phase: state.phase,
            is_running: state.is_running(),
            time_left_seconds: state.time_left_seconds,
            display: state.display(),
            action_label: state.action_label().to_string(),
            is_minimized: state.is_minimized,
            position: state.position,
        }
    }
}
