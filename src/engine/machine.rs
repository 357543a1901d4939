//! Pure timer state machine.
//!
//! Every transition takes the current wall-clock time explicitly and performs
//! no I/O. Callers decide what to do with the returned [`Outcome`]: persist the
//! state, fire the completion side effects, and restart or halt their local
//! countdown loop.

use crate::{
    error::TimerError,
    state::{Position, TimerMode, TimerPhase, TimerSettings, TimerState},
};

/// What a transition did to the state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Any field other than the timestamp changed
    pub changed: bool,
    /// The state must be written to the shared store
    pub persist: bool,
    /// The countdown reached zero during this transition
    pub completed: bool,
}

impl Outcome {
    pub const NONE: Outcome = Outcome {
        changed: false,
        persist: false,
        completed: false,
    };

    fn persisted(changed: bool) -> Self {
        Self {
            changed,
            persist: true,
            completed: false,
        }
    }
}

/// Begin counting down. Only valid while time is left.
///
/// Starting a running timer only refreshes its timestamp.
pub fn start(state: &mut TimerState, now_ms: i64) -> Result<Outcome, TimerError> {
    if state.time_left_seconds == 0 {
        return Err(TimerError::NothingToStart(state.mode));
    }

    let changed = !state.is_running();
    state.phase = TimerPhase::Running;
    state.last_update_epoch_ms = now_ms;
    Ok(Outcome::persisted(changed))
}

/// Halt the countdown. A halted timer is left untouched.
pub fn pause(state: &mut TimerState, now_ms: i64) -> Outcome {
    if !state.is_running() {
        return Outcome::NONE;
    }

    state.phase = state.halted_phase();
    state.last_update_epoch_ms = now_ms;
    Outcome::persisted(true)
}

/// One elapsed second of a running countdown
pub fn tick(state: &mut TimerState, now_ms: i64) -> Outcome {
    if !state.is_running() {
        return Outcome::NONE;
    }

    if state.time_left_seconds > 0 {
        state.time_left_seconds -= 1;
        state.last_update_epoch_ms = now_ms;
        if state.time_left_seconds > 0 {
            return Outcome::persisted(true);
        }
    }

    complete(state, now_ms)
}

/// Enter the completed phase. Only fires once per run: a timer that is not
/// running has nothing to complete.
pub fn complete(state: &mut TimerState, now_ms: i64) -> Outcome {
    if !state.is_running() {
        return Outcome::NONE;
    }

    state.time_left_seconds = 0;
    state.phase = TimerPhase::Completed;
    state.last_update_epoch_ms = now_ms;
    Outcome {
        changed: true,
        persist: true,
        completed: true,
    }
}

/// Select a mode, resetting to its full duration and halting any countdown
pub fn switch_mode(
    state: &mut TimerState,
    mode: TimerMode,
    settings: &TimerSettings,
    now_ms: i64,
) -> Outcome {
    let before = state.clone();

    state.mode = mode;
    state.time_left_seconds = settings.duration_for(mode);
    state.phase = TimerPhase::Paused;
    state.last_update_epoch_ms = now_ms;

    Outcome::persisted(differs_ignoring_stamp(&before, state))
}

/// Primary control: pause when running, start when paused, and restart the
/// current mode from its full duration once completed.
pub fn toggle(
    state: &mut TimerState,
    settings: &TimerSettings,
    now_ms: i64,
) -> Result<Outcome, TimerError> {
    match state.phase {
        TimerPhase::Running => Ok(pause(state, now_ms)),
        TimerPhase::Paused => start(state, now_ms),
        TimerPhase::Completed => {
            state.time_left_seconds = settings.duration_for(state.mode);
            state.phase = TimerPhase::Paused;
            start(state, now_ms).map(|outcome| Outcome {
                changed: true,
                ..outcome
            })
        }
    }
}

/// Presentation-only fields leave the countdown stamp untouched
pub fn toggle_minimize(state: &mut TimerState) -> Outcome {
    state.is_minimized = !state.is_minimized;
    Outcome::persisted(true)
}

pub fn set_position(state: &mut TimerState, position: Option<Position>) -> Outcome {
    let changed = state.position != position;
    state.position = position;
    Outcome::persisted(changed)
}

/// Re-fit the state after the duration table changed.
///
/// An untouched paused timer follows the new duration; otherwise the
/// remaining time is only clamped so it never exceeds the active mode.
pub fn apply_settings(
    state: &mut TimerState,
    previous: &TimerSettings,
    settings: &TimerSettings,
    now_ms: i64,
) -> Outcome {
    let limit = settings.duration_for(state.mode);
    let untouched = state.phase == TimerPhase::Paused
        && state.time_left_seconds == previous.duration_for(state.mode);

    let next = if untouched {
        limit
    } else {
        state.time_left_seconds.min(limit)
    };

    if next == state.time_left_seconds {
        return Outcome::NONE;
    }

    state.time_left_seconds = next;
    state.last_update_epoch_ms = now_ms;
    Outcome::persisted(true)
}

/// Build the working state for a cold load.
///
/// A reload always resumes paused: the persisted record is clamped into the
/// active mode's range, halted, and stamped with the load time.
pub fn hydrate(persisted: Option<TimerState>, settings: &TimerSettings, now_ms: i64) -> TimerState {
    let Some(mut state) = persisted else {
        return TimerState::initial(settings, now_ms);
    };

    state.time_left_seconds = state
        .time_left_seconds
        .min(settings.duration_for(state.mode));
    state.phase = state.halted_phase();
    state.last_update_epoch_ms = now_ms;
    state
}

/// Advance the shared record by the wall-clock time elapsed since it was last
/// stamped.
///
/// Acts only while this instance is visible and believes it is running. If the
/// shared record has been halted elsewhere it is adopted as-is. Whole elapsed
/// seconds are subtracted (clamped at zero); a clock that moved backwards
/// yields no change. Returns `None` when there is nothing to do.
pub fn reconcile(
    local: &TimerState,
    persisted: &TimerState,
    visible: bool,
    now_ms: i64,
) -> Option<(TimerState, Outcome)> {
    if !visible || !local.is_running() {
        return None;
    }

    if !persisted.is_running() {
        let changed = differs_ignoring_stamp(local, persisted);
        return Some((persisted.clone(), Outcome { changed, ..Outcome::NONE }));
    }

    let elapsed_seconds = now_ms.saturating_sub(persisted.last_update_epoch_ms).max(0) / 1000;
    if elapsed_seconds == 0 {
        return None;
    }

    let mut next = persisted.clone();
    next.time_left_seconds = next
        .time_left_seconds
        .saturating_sub(elapsed_seconds as u64);
    next.last_update_epoch_ms = now_ms;

    let completed = next.time_left_seconds == 0;
    if completed {
        next.phase = TimerPhase::Completed;
    }

    Some((
        next,
        Outcome {
            changed: true,
            persist: true,
            completed,
        },
    ))
}

/// Take another instance's record wholesale as the new working state.
///
/// Adoption never fires completion: the instance that reached zero already did.
pub fn adopt(local: &TimerState, external: TimerState) -> (TimerState, Outcome) {
    let changed = differs_ignoring_stamp(local, &external);
    (external, Outcome { changed, ..Outcome::NONE })
}

fn differs_ignoring_stamp(a: &TimerState, b: &TimerState) -> bool {
    a.mode != b.mode
        || a.time_left_seconds != b.time_left_seconds
        || a.phase != b.phase
        || a.is_minimized != b.is_minimized
        || a.position != b.position
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn settings() -> TimerSettings {
        TimerSettings::default()
    }

    fn running(time_left_seconds: u64, last_update_epoch_ms: i64) -> TimerState {
        TimerState {
            time_left_seconds,
            phase: TimerPhase::Running,
            last_update_epoch_ms,
            ..TimerState::initial(&settings(), last_update_epoch_ms)
        }
    }

    #[test]
    fn switch_mode_resets_duration_and_halts() {
        for mode in TimerMode::ALL {
            let mut state = running(17, T0);
            let outcome = switch_mode(&mut state, mode, &settings(), T0 + 5);

            assert_eq!(state.mode, mode);
            assert_eq!(state.time_left_seconds, settings().duration_for(mode));
            assert!(!state.is_running());
            assert_eq!(state.last_update_epoch_ms, T0 + 5);
            assert!(outcome.persist);
        }
    }

    #[test]
    fn switch_mode_from_completed_is_paused_not_completed() {
        let mut state = running(1, T0);
        tick(&mut state, T0 + 1000);
        assert!(state.is_completed());

        switch_mode(&mut state, TimerMode::ShortBreak, &settings(), T0 + 2000);
        assert_eq!(state.phase, TimerPhase::Paused);
        assert_eq!(state.time_left_seconds, 300);
    }

    #[test]
    fn five_ticks_after_start() {
        let mut state = TimerState::initial(&settings(), T0);
        start(&mut state, T0).unwrap();
        for i in 1..=5 {
            tick(&mut state, T0 + i * 1000);
        }

        assert_eq!(state.time_left_seconds, 1495);
        assert!(state.is_running());
    }

    #[test]
    fn last_second_tick_completes_once() {
        let mut state = running(1, T0);

        let outcome = tick(&mut state, T0 + 1000);
        assert_eq!(state.time_left_seconds, 0);
        assert!(!state.is_running());
        assert!(state.is_completed());
        assert!(outcome.completed);

        for i in 2..5 {
            let again = tick(&mut state, T0 + i * 1000);
            assert_eq!(again, Outcome::NONE);
        }
    }

    #[test]
    fn tick_on_running_zero_completes() {
        let mut state = running(0, T0);
        let outcome = tick(&mut state, T0 + 1000);

        assert!(outcome.completed);
        assert!(!state.is_running());
        assert_eq!(tick(&mut state, T0 + 2000), Outcome::NONE);
    }

    #[test]
    fn tick_while_paused_does_nothing() {
        let mut state = TimerState::initial(&settings(), T0);
        assert_eq!(tick(&mut state, T0 + 1000), Outcome::NONE);
        assert_eq!(state.time_left_seconds, 1500);
    }

    #[test]
    fn start_rejects_exhausted_timer() {
        let mut state = TimerState {
            time_left_seconds: 0,
            phase: TimerPhase::Completed,
            ..TimerState::initial(&settings(), T0)
        };
        assert_eq!(
            start(&mut state, T0),
            Err(TimerError::NothingToStart(TimerMode::Focus))
        );
        assert!(!state.is_running());
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let mut state = running(100, T0);
        let before = state.clone();
        let outcome = start(&mut state, T0 + 400).unwrap();
        assert!(!outcome.changed);
        assert_eq!(state.last_update_epoch_ms, T0 + 400);
        assert_eq!(
            TimerState {
                last_update_epoch_ms: before.last_update_epoch_ms,
                ..state.clone()
            },
            before
        );

        let mut paused = TimerState::initial(&settings(), T0);
        let snapshot = paused.clone();
        assert_eq!(pause(&mut paused, T0 + 1000), Outcome::NONE);
        assert_eq!(paused, snapshot);
    }

    #[test]
    fn toggle_restarts_completed_timer() {
        let mut state = running(1, T0);
        tick(&mut state, T0 + 1000);

        let outcome = toggle(&mut state, &settings(), T0 + 2000).unwrap();
        assert!(outcome.changed);
        assert!(state.is_running());
        assert_eq!(state.time_left_seconds, 1500);

        toggle(&mut state, &settings(), T0 + 3000).unwrap();
        assert_eq!(state.phase, TimerPhase::Paused);
    }

    #[test]
    fn reconcile_uses_wall_clock_not_ticks() {
        let persisted = running(100, T0);
        // Local copy only saw two ticks while suspended.
        let local = running(98, T0 + 2000);

        let (next, outcome) = reconcile(&local, &persisted, true, T0 + 37_000).unwrap();
        assert_eq!(next.time_left_seconds, 63);
        assert!(next.is_running());
        assert_eq!(next.last_update_epoch_ms, T0 + 37_000);
        assert!(outcome.persist);
        assert!(!outcome.completed);
    }

    #[test]
    fn reconcile_clamps_at_zero_and_completes() {
        let persisted = running(10, T0);
        let (next, outcome) = reconcile(&persisted, &persisted, true, T0 + 60_000).unwrap();

        assert_eq!(next.time_left_seconds, 0);
        assert!(next.is_completed());
        assert!(outcome.completed);
    }

    #[test]
    fn reconcile_ignores_clock_rollback_and_subsecond_gaps() {
        let persisted = running(50, T0);
        assert!(reconcile(&persisted, &persisted, true, T0 - 10_000).is_none());
        assert!(reconcile(&persisted, &persisted, true, T0 + 999).is_none());
    }

    #[test]
    fn reconcile_survives_out_of_range_timestamps() {
        let local = running(100, T0);

        let ancient = running(100, i64::MIN);
        let (next, outcome) = reconcile(&local, &ancient, true, T0).unwrap();
        assert!(next.is_completed());
        assert!(outcome.completed);

        let future = running(100, i64::MAX);
        assert!(reconcile(&local, &future, true, T0).is_none());
    }

    #[test]
    fn reconcile_is_inert_when_hidden_or_locally_paused() {
        let persisted = running(50, T0);
        assert!(reconcile(&persisted, &persisted, false, T0 + 5000).is_none());

        let paused = TimerState::initial(&settings(), T0);
        assert!(reconcile(&paused, &persisted, true, T0 + 5000).is_none());
    }

    #[test]
    fn reconcile_adopts_record_halted_elsewhere() {
        let local = running(50, T0);
        let mut persisted = local.clone();
        pause(&mut persisted, T0 + 500);

        let (next, outcome) = reconcile(&local, &persisted, true, T0 + 3000).unwrap();
        assert_eq!(next, persisted);
        assert!(!outcome.persist);
        assert!(outcome.changed);
    }

    #[test]
    fn ui_fields_keep_the_countdown_stamp() {
        let mut state = running(100, T0);
        assert!(toggle_minimize(&mut state).persist);
        assert!(set_position(&mut state, Some(Position { x: 5, y: 6 })).changed);
        assert_eq!(state.last_update_epoch_ms, T0);

        let (next, _) = reconcile(&state, &state, true, T0 + 3000).unwrap();
        assert_eq!(next.time_left_seconds, 97);
        assert!(next.is_minimized);
    }

    #[test]
    fn hydrate_forces_paused_and_clamps() {
        let stored = TimerState {
            mode: TimerMode::ShortBreak,
            time_left_seconds: 5000,
            ..running(5000, T0)
        };
        let state = hydrate(Some(stored), &settings(), T0 + 9000);

        assert_eq!(state.time_left_seconds, 300);
        assert_eq!(state.phase, TimerPhase::Paused);
        assert_eq!(state.last_update_epoch_ms, T0 + 9000);

        let fresh = hydrate(None, &settings(), T0);
        assert_eq!(fresh, TimerState::initial(&settings(), T0));
    }

    #[test]
    fn apply_settings_follows_untouched_timer_and_clamps_started_one() {
        let old = settings();
        let new = TimerSettings {
            focus: 600,
            ..old
        };

        let mut untouched = TimerState::initial(&old, T0);
        apply_settings(&mut untouched, &old, &new, T0 + 1);
        assert_eq!(untouched.time_left_seconds, 600);

        let mut started = running(1200, T0);
        apply_settings(&mut started, &old, &new, T0 + 1);
        assert_eq!(started.time_left_seconds, 600);
        assert!(started.is_running());

        let mut short = running(100, T0);
        assert_eq!(apply_settings(&mut short, &old, &new, T0 + 1), Outcome::NONE);
    }

    #[test]
    fn adopt_takes_external_state_without_completion() {
        let local = running(40, T0);
        let external = TimerState {
            time_left_seconds: 0,
            phase: TimerPhase::Completed,
            ..local.clone()
        };

        let (next, outcome) = adopt(&local, external.clone());
        assert_eq!(next, external);
        assert!(outcome.changed);
        assert!(!outcome.completed);
        assert!(!outcome.persist);
    }
}
