//! TaskWise Timer - a pomodoro countdown kept consistent across instances
//!
//! This is the main entry point: one process is one timer instance.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use taskwise_timer::{
    api::create_router,
    config::Config,
    services::{CompletionNotifier, SystemNotifier},
    state::AppState,
    store::{FileStore, InstanceId, KeyValueStore, TimerStore},
    tasks::{countdown_task, external_change_task, file_watch_task, state_sync_task},
    utils::{shutdown_signal, Clock, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("taskwise_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting taskwise-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={}",
        config.host,
        config.port,
        config.data_dir.display()
    );

    let file_store = Arc::new(
        FileStore::open(&config.data_dir)
            .with_context(|| format!("opening data directory {}", config.data_dir.display()))?,
    );
    let store = TimerStore::new(
        Arc::clone(&file_store) as Arc<dyn KeyValueStore>,
        InstanceId::new(),
    );

    let permission = SystemNotifier::resolve_permission(config.notifications).await;
    let notifier: Arc<dyn CompletionNotifier> =
        Arc::new(SystemNotifier::new(permission, config.alarm_sound.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Create the instance context
    let state = Arc::new(AppState::new(store, notifier, clock));
    info!("Timer instance {} ready", state.instance());

    if config.background {
        state.set_visible(false)?;
    }

    // Start background tasks
    tokio::spawn(file_watch_task(Arc::clone(&file_store)));
    tokio::spawn(external_change_task(Arc::clone(&state)));
    tokio::spawn(countdown_task(Arc::clone(&state)));
    tokio::spawn(state_sync_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer              - Current timer display");
    info!("  POST /timer/start        - Start the countdown");
    info!("  POST /timer/pause        - Pause the countdown");
    info!("  POST /timer/toggle       - Start, pause or restart");
    info!("  POST /timer/mode/:mode   - Switch to focus, short_break or long_break");
    info!("  POST /timer/minimize     - Toggle the minimized hint");
    info!("  PUT  /timer/position     - Save the widget position");
    info!("  GET  /settings           - Current durations");
    info!("  PUT  /settings           - Override durations");
    info!("  POST /visibility         - Foreground/background");
    info!("  GET  /status             - Instance status");
    info!("  GET  /health             - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if state.flush()? {
        info!("Running timer state flushed");
    }
    info!("Shutdown complete");
    Ok(())
}
