//! Local one-second decrement loop

use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::TICK_INTERVAL;
use crate::state::AppState;

/// Tick the instance once per second while its running flag is set.
///
/// Every change of the flag restarts the schedule from scratch, so a restart
/// after adopting another instance's state begins a full second later.
pub async fn countdown_task(state: Arc<AppState>) {
    info!("Starting countdown task");

    let mut running_rx = state.running_flag();

    loop {
        if !*running_rx.borrow_and_update() {
            if running_rx.changed().await.is_err() {
                break;
            }
            continue;
        }

        debug!("Countdown loop started");
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = state.countdown_tick() {
                        error!("Countdown tick failed: {}", e);
                    }
                }

                changed = running_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    debug!("Countdown loop interrupted");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::CompletionNotifier,
        state::{SettingsOverride, TimerMode, TimerPhase},
        store::{InstanceId, MemoryStore, TimerStore},
        test_support::{RecordingNotifier, TokioClock},
        utils::Clock,
    };
    use std::time::Duration;

    fn instance(notifier: Arc<RecordingNotifier>) -> Arc<AppState> {
        Arc::new(AppState::new(
            TimerStore::new(Arc::new(MemoryStore::new()), InstanceId::new()),
            notifier as Arc<dyn CompletionNotifier>,
            Arc::new(TokioClock::new()) as Arc<dyn Clock>,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_while_running() {
        let state = instance(Arc::new(RecordingNotifier::default()));
        tokio::spawn(countdown_task(Arc::clone(&state)));

        state.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.time_left_seconds, 1495);
        assert!(snapshot.is_running);

        state.pause().unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(state.snapshot().unwrap().time_left_seconds, 1495);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_itself_on_completion() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = instance(Arc::clone(&notifier));
        tokio::spawn(countdown_task(Arc::clone(&state)));

        state
            .update_settings(&SettingsOverride {
                long_break: Some(3),
                ..Default::default()
            })
            .unwrap();
        state.switch_mode(TimerMode::LongBreak).unwrap();
        state.start().unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Completed);
        assert_eq!(snapshot.display, "00:00");
        assert_eq!(notifier.completions(), vec![TimerMode::LongBreak]);
    }
}
