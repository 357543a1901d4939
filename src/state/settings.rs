//! Per-mode countdown durations

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::TimerMode;

pub const DEFAULT_FOCUS_SECONDS: u64 = 25 * 60;
pub const DEFAULT_SHORT_BREAK_SECONDS: u64 = 5 * 60;
pub const DEFAULT_LONG_BREAK_SECONDS: u64 = 15 * 60;

/// Duration in seconds for every timer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub focus: u64,
    pub short_break: u64,
    pub long_break: u64,
}

impl TimerSettings {
    pub fn duration_for(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    /// Merge a partial override over these settings; the override wins per key.
    ///
    /// Zero durations are ignored so a mode can never start already expired.
    pub fn merged(mut self, overrides: &SettingsOverride) -> Self {
        for mode in TimerMode::ALL {
            let Some(seconds) = overrides.get(mode) else {
                continue;
            };
            if seconds == 0 {
                warn!("Ignoring zero duration override for {}", mode);
                continue;
            }
            match mode {
                TimerMode::Focus => self.focus = seconds,
                TimerMode::ShortBreak => self.short_break = seconds,
                TimerMode::LongBreak => self.long_break = seconds,
            }
        }
        self
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus: DEFAULT_FOCUS_SECONDS,
            short_break: DEFAULT_SHORT_BREAK_SECONDS,
            long_break: DEFAULT_LONG_BREAK_SECONDS,
        }
    }
}

/// Partial user override as stored under `timer_settings`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break: Option<u64>,
}

impl SettingsOverride {
    pub fn get(&self, mode: TimerMode) -> Option<u64> {
        match mode {
            TimerMode::Focus => self.focus,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    /// Combine two overrides; keys present in `newer` win
    pub fn layered(self, newer: &SettingsOverride) -> Self {
        Self {
            focus: newer.focus.or(self.focus),
            short_break: newer.short_break.or(self.short_break),
            long_break: newer.long_break.or(self.long_break),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pomodoro_lengths() {
        let settings = TimerSettings::default();
        assert_eq!(settings.focus, 1500);
        assert_eq!(settings.short_break, 300);
        assert_eq!(settings.long_break, 900);
    }

    #[test]
    fn override_wins_per_key_only() {
        let overrides: SettingsOverride = serde_json::from_str(r#"{"short_break":600}"#).unwrap();
        let settings = TimerSettings::default().merged(&overrides);

        assert_eq!(settings.short_break, 600);
        assert_eq!(settings.focus, 1500);
        assert_eq!(settings.long_break, 900);
    }

    #[test]
    fn zero_override_is_ignored() {
        let overrides = SettingsOverride {
            focus: Some(0),
            ..Default::default()
        };
        assert_eq!(TimerSettings::default().merged(&overrides).focus, 1500);
    }

    #[test]
    fn layered_overrides_keep_older_keys() {
        let older = SettingsOverride {
            focus: Some(1800),
            long_break: Some(1200),
            ..Default::default()
        };
        let newer = SettingsOverride {
            long_break: Some(600),
            ..Default::default()
        };

        let combined = older.layered(&newer);
        assert_eq!(combined.focus, Some(1800));
        assert_eq!(combined.short_break, None);
        assert_eq!(combined.long_break, Some(600));
    }
}
