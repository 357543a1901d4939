//! Completion notification and alarm playback.
//!
//! Both actions are fire-and-forget: they are spawned onto the runtime, never
//! awaited by the timer, and any failure is dropped after a debug log.

use std::{io::Write, path::PathBuf};

use clap::ValueEnum;
use tokio::{process::Command, runtime::Handle};
use tracing::{debug, info};

use crate::state::TimerMode;

const NOTIFICATION_TITLE: &str = "Timer Complete!";
const NOTIFY_SEND: &str = "notify-send";
const PAPLAY: &str = "paplay";

/// Receives the side effects of a countdown reaching zero
pub trait CompletionNotifier: Send + Sync {
    /// Must return immediately
    fn notify_complete(&self, mode: TimerMode);
}

/// Whether desktop notifications may be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotificationPermission {
    /// Not decided yet; resolved at startup
    Default,
    Granted,
    Denied,
}

/// Desktop notification through `notify-send` plus an alarm through `paplay`
/// (or the terminal bell when no sound file is configured)
#[derive(Debug, Clone)]
pub struct SystemNotifier {
    permission: NotificationPermission,
    alarm_sound: Option<PathBuf>,
}

impl SystemNotifier {
    pub fn new(permission: NotificationPermission, alarm_sound: Option<PathBuf>) -> Self {
        Self {
            permission,
            alarm_sound,
        }
    }

    /// Settle an undecided permission by checking whether a notification
    /// daemon client is installed. Explicit choices are kept as-is.
    pub async fn resolve_permission(requested: NotificationPermission) -> NotificationPermission {
        if requested != NotificationPermission::Default {
            return requested;
        }

        let available = Command::new(NOTIFY_SEND)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false);

        let resolved = if available {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        };
        info!("Notification permission resolved to {:?}", resolved);
        resolved
    }
}

impl CompletionNotifier for SystemNotifier {
    fn notify_complete(&self, mode: TimerMode) {
        let Ok(handle) = Handle::try_current() else {
            debug!("No runtime available, skipping completion side effects");
            return;
        };

        if self.permission == NotificationPermission::Granted {
            handle.spawn(async move {
                if let Err(e) = show_notification(completion_message(mode)).await {
                    debug!("Notification skipped: {}", e);
                }
            });
        }

        let sound = self.alarm_sound.clone();
        handle.spawn(async move {
            if let Err(e) = play_alarm(sound).await {
                debug!("Alarm skipped: {}", e);
            }
        });
    }
}

/// Notification body for a finished countdown in `mode`
pub fn completion_message(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Focus => "Time to take a break!",
        TimerMode::ShortBreak | TimerMode::LongBreak => "Break is over, time to focus!",
    }
}

async fn show_notification(body: &str) -> Result<(), String> {
    let output = Command::new(NOTIFY_SEND)
        .args(["--app-name=TaskWise", NOTIFICATION_TITLE, body])
        .output()
        .await
        .map_err(|e| format!("failed to execute {}: {}", NOTIFY_SEND, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", NOTIFY_SEND, stderr));
    }
    Ok(())
}

async fn play_alarm(sound: Option<PathBuf>) -> Result<(), String> {
    let Some(path) = sound else {
        let mut stderr = std::io::stderr();
        return stderr
            .write_all(b"\x07")
            .and_then(|_| stderr.flush())
            .map_err(|e| format!("terminal bell failed: {}", e));
    };

    let output = Command::new(PAPLAY)
        .arg(&path)
        .output()
        .await
        .map_err(|e| format!("failed to execute {}: {}", PAPLAY, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} {} failed: {}", PAPLAY, path.display(), stderr));
    }
    Ok(())
}
