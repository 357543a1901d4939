//! Per-instance timer context

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Position, SettingsOverride, TimerMode, TimerSettings, TimerSnapshot, TimerState};
use crate::{
    engine::{machine, Outcome},
    error::TimerError,
    services::CompletionNotifier,
    store::{InstanceId, TimerStore},
    utils::Clock,
};

/// A wall-clock gap this large between countdown ticks means ticks were
/// missed (suspension, throttling), so the tick is handled as a reconciliation.
const STALE_TICK_MS: i64 = 2_000;

/// Everything one timer instance owns.
///
/// Built once at process start and shared by reference with the tasks and the
/// HTTP layer. All operations lock the working state, so ticks, reconciliations,
/// and user actions on one instance never interleave.
pub struct AppState {
    /// In-memory working copy, reconciled against the shared record
    timer: Mutex<TimerState>,
    settings: Mutex<TimerSettings>,
    store: TimerStore,
    notifier: Arc<dyn CompletionNotifier>,
    clock: Arc<dyn Clock>,
    /// Foreground flag; background instances neither tick nor reconcile
    visible_tx: watch::Sender<bool>,
    /// Drives the countdown loop; every send restarts or halts it
    running_tx: watch::Sender<bool>,
    /// Server metadata
    pub start_time: Instant,
    /// Last user action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Hydrate a new instance from the shared store. A cold load always
    /// resumes paused.
    pub fn new(
        store: TimerStore,
        notifier: Arc<dyn CompletionNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = store.load_settings();
        let timer = store.load_state(&settings, clock.now_ms());
        info!(
            "Timer instance {} loaded: mode={}, remaining={}",
            store.instance(),
            timer.mode,
            timer.display()
        );

        Self {
            timer: Mutex::new(timer),
            settings: Mutex::new(settings),
            store,
            notifier,
            clock,
            visible_tx: watch::Sender::new(true),
            running_tx: watch::Sender::new(false),
            start_time: Instant::now(),
            last_action: Mutex::new(None),
        }
    }

    pub fn instance(&self) -> InstanceId {
        self.store.instance()
    }

    pub fn store(&self) -> &TimerStore {
        &self.store
    }

    pub fn start(&self) -> Result<TimerSnapshot, TimerError> {
        self.apply(Some("start"), true, |timer, _, now| machine::start(timer, now))
    }

    pub fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        self.apply(Some("pause"), false, |timer, _, now| Ok(machine::pause(timer, now)))
    }

    /// Start, pause, or restart depending on the current phase
    pub fn toggle(&self) -> Result<TimerSnapshot, TimerError> {
        self.apply(Some("toggle"), true, machine::toggle)
    }

    pub fn switch_mode(&self, mode: TimerMode) -> Result<TimerSnapshot, TimerError> {
        info!("Switching timer mode to {}", mode);
        self.apply(Some("switch-mode"), false, |timer, settings, now| {
            Ok(machine::switch_mode(timer, mode, settings, now))
        })
    }

    pub fn toggle_minimize(&self) -> Result<TimerSnapshot, TimerError> {
        self.apply(Some("minimize"), false, |timer, _, _| Ok(machine::toggle_minimize(timer)))
    }

    pub fn set_position(&self, position: Option<Position>) -> Result<TimerSnapshot, TimerError> {
        self.apply(Some("position"), false, |timer, _, _| {
            Ok(machine::set_position(timer, position))
        })
    }

    /// Layer a partial override over the stored one and re-fit the timer
    pub fn update_settings(&self, overrides: &SettingsOverride) -> Result<TimerSettings, TimerError> {
        let combined = self.store.load_settings_override().layered(overrides);
        if let Err(e) = self.store.save_settings_override(&combined) {
            warn!("Failed to persist timer settings: {}", e);
        }

        let next = TimerSettings::default().merged(&combined);
        let previous = {
            let mut settings = self
                .settings
                .lock()
                .map_err(|e| TimerError::lock("timer settings", e))?;
            std::mem::replace(&mut *settings, next)
        };
        info!("Timer settings updated: {:?}", next);

        self.apply(Some("settings"), false, |timer, settings, now| {
            Ok(machine::apply_settings(timer, &previous, settings, now))
        })?;
        Ok(next)
    }

    /// One beat of the local countdown loop.
    ///
    /// Background instances skip their ticks. A tick arriving long after the
    /// last accurate stamp recomputes from wall-clock time instead of
    /// counting a single second.
    pub fn countdown_tick(&self) -> Result<TimerSnapshot, TimerError> {
        if !self.is_visible() {
            debug!("Skipping countdown tick while in background");
            return self.snapshot();
        }

        let now = self.clock.now_ms();
        let stale = {
            let timer = self.lock_timer()?;
            now.saturating_sub(timer.last_update_epoch_ms) >= STALE_TICK_MS
        };

        if stale {
            debug!("Countdown tick is stale, reconciling against wall clock");
            return self.reconcile_now();
        }
        self.apply(None, false, |timer, _, now| Ok(machine::tick(timer, now)))
    }

    /// Advance the shared record by the wall-clock time that passed since it
    /// was last stamped, and take the result as the working state
    pub fn reconcile_now(&self) -> Result<TimerSnapshot, TimerError> {
        let visible = self.is_visible();

        self.apply_replacement(|timer, now| {
            let persisted = self
                .store
                .read_persisted()
                .unwrap_or_else(|| timer.clone());
            machine::reconcile(timer, &persisted, visible, now)
        })
    }

    /// Take a record written by another instance as the working state and
    /// restart or halt the local countdown to match it
    pub fn adopt_external(&self, external: TimerState) -> Result<TimerSnapshot, TimerError> {
        debug!(
            "Adopting external timer state: mode={}, remaining={}, running={}",
            external.mode,
            external.time_left_seconds,
            external.is_running()
        );
        self.apply_replacement(|timer, _| Some(machine::adopt(timer, external)))
    }

    /// Move to the foreground or background. Coming back to the foreground
    /// reconciles immediately.
    pub fn set_visible(&self, visible: bool) -> Result<TimerSnapshot, TimerError> {
        let was_visible = self.visible_tx.send_replace(visible);
        info!("Instance visibility set to {}", if visible { "foreground" } else { "background" });

        if visible && !was_visible {
            return self.reconcile_now();
        }
        self.snapshot()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer().map(|t| t.is_running()).unwrap_or(false)
    }

    /// Write the working state to the shared store before exiting.
    ///
    /// Only a running instance holds the freshest copy; a halted one leaves
    /// the shared record to whoever wrote it last.
    pub fn flush(&self) -> Result<bool, TimerError> {
        let timer = self.lock_timer()?;
        if !timer.is_running() {
            return Ok(false);
        }

        if let Err(e) = self.store.save_state(&timer) {
            warn!("Failed to flush timer state: {}", e);
            return Ok(false);
        }
        Ok(true)
    }

    pub fn timer_state(&self) -> Result<TimerState, TimerError> {
        self.lock_timer().map(|t| t.clone())
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, TimerError> {
        self.lock_timer().map(|t| TimerSnapshot::from(&*t))
    }

    pub fn settings(&self) -> Result<TimerSettings, TimerError> {
        self.settings
            .lock()
            .map(|s| *s)
            .map_err(|e| TimerError::lock("timer settings", e))
    }

    /// Watch the countdown loop flag
    pub fn running_flag(&self) -> watch::Receiver<bool> {
        self.running_tx.subscribe()
    }

    /// Calculate instance uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    fn lock_timer(&self) -> Result<std::sync::MutexGuard<'_, TimerState>, TimerError> {
        self.timer
            .lock()
            .map_err(|e| TimerError::lock("timer state", e))
    }

    /// Run an in-place transition and handle its outcome.
    ///
    /// `restart` asks for the countdown loop to be restarted even when the
    /// running flag does not change.
    fn apply<F>(&self, action: Option<&str>, restart: bool, transition: F) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&mut TimerState, &TimerSettings, i64) -> Result<Outcome, TimerError>,
    {
        let settings = self.settings()?;
        let now = self.clock.now_ms();

        let mut timer = self.lock_timer()?;
        let outcome = transition(&mut *timer, &settings, now)?;
        let finished = self.commit(&timer, outcome);
        drop(timer);

        if let Some(action) = action {
            if let Ok(mut last) = self.last_action.lock() {
                *last = Some((action.to_string(), Utc::now()));
            }
        }
        Ok(self.publish(finished, outcome, restart))
    }

    /// Run a transition that produces a whole new working state, if any.
    /// Replacements always re-derive the countdown loop.
    fn apply_replacement<F>(&self, transition: F) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&TimerState, i64) -> Option<(TimerState, Outcome)>,
    {
        let now = self.clock.now_ms();

        let mut timer = self.lock_timer()?;
        let Some((next, outcome)) = transition(&*timer, now) else {
            return Ok(TimerSnapshot::from(&*timer));
        };
        *timer = next;
        let finished = self.commit(&timer, outcome);
        drop(timer);

        Ok(self.publish(finished, outcome, true))
    }

    /// Persist under the state lock so writes leave in transition order
    fn commit(&self, timer: &TimerState, outcome: Outcome) -> TimerState {
        if outcome.persist {
            if let Err(e) = self.store.save_state(timer) {
                warn!("Failed to persist timer state: {}", e);
            }
        }
        timer.clone()
    }

    fn publish(&self, timer: TimerState, outcome: Outcome, restart: bool) -> TimerSnapshot {
        if outcome.completed {
            info!("{} timer complete", timer.mode);
            self.notifier.notify_complete(timer.mode);
        }

        let running = timer.is_running();
        if restart || *self.running_tx.borrow() != running {
            self.running_tx.send_replace(running);
        }

        if outcome.changed {
            debug!(
                "Timer now {} {} ({:?})",
                timer.mode,
                timer.display(),
                timer.phase
            );
        }
        TimerSnapshot::from(&timer)
    }
}
