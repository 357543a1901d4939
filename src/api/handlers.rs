//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info, warn};

use super::responses::{
    ApiResponse, ErrorResponse, HealthResponse, PositionRequest, StatusResponse, VisibilityRequest,
};
use crate::{
    error::TimerError,
    state::{AppState, SettingsOverride, TimerMode, TimerSettings},
};

/// Handler error carrying the HTTP status it maps to
#[derive(Debug)]
pub struct ApiError(TimerError);

impl From<TimerError> for ApiError {
    fn from(e: TimerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TimerError::NothingToStart(_) => StatusCode::CONFLICT,
            TimerError::UnknownMode(_) => StatusCode::BAD_REQUEST,
            TimerError::StateLock { .. } => {
                error!("Timer state unavailable: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Handle GET /timer - Current display snapshot
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.snapshot()?;
    Ok(Json(ApiResponse::new(timer.display.clone(), timer)))
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    match state.start() {
        Ok(timer) => {
            info!("Start endpoint called - {} timer running", timer.mode);
            Ok(Json(ApiResponse::new("Timer started", timer)))
        }
        Err(e) => {
            warn!("Failed to start timer: {}", e);
            Err(e.into())
        }
    }
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.pause()?;
    info!("Pause endpoint called - timer paused at {}", timer.display);
    Ok(Json(ApiResponse::new("Timer paused", timer)))
}

/// Handle POST /timer/toggle - Start, pause or restart
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.toggle()?;
    info!("Toggle endpoint called - timer now {:?}", timer.phase);
    Ok(Json(ApiResponse::new("Timer toggled", timer)))
}

/// Handle POST /timer/mode/:mode
pub async fn mode_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<String>,
) -> ApiResult<ApiResponse> {
    let mode = TimerMode::from_name(&mode).ok_or(TimerError::UnknownMode(mode))?;
    let timer = state.switch_mode(mode)?;
    Ok(Json(ApiResponse::new(format!("Switched to {}", mode), timer)))
}

/// Handle POST /timer/minimize - Toggle the minimized display hint
pub async fn minimize_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let timer = state.toggle_minimize()?;
    let message = if timer.is_minimized { "Timer minimized" } else { "Timer restored" };
    Ok(Json(ApiResponse::new(message, timer)))
}

/// Handle PUT /timer/position
pub async fn position_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PositionRequest>,
) -> ApiResult<ApiResponse> {
    let timer = state.set_position(request.position())?;
    Ok(Json(ApiResponse::new("Position saved", timer)))
}

/// Handle GET /settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> ApiResult<TimerSettings> {
    Ok(Json(state.settings()?))
}

/// Handle PUT /settings - Merge a partial duration override
pub async fn put_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(overrides): Json<SettingsOverride>,
) -> ApiResult<TimerSettings> {
    Ok(Json(state.update_settings(&overrides)?))
}

/// Handle POST /visibility - Foreground/background notification from the UI
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VisibilityRequest>,
) -> ApiResult<ApiResponse> {
    let timer = state.set_visible(request.visible)?;
    let message = if request.visible { "Instance in foreground" } else { "Instance in background" };
    Ok(Json(ApiResponse::new(message, timer)))
}

/// Handle GET /status - Return instance status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        instance: state.instance(),
        timer: state.snapshot()?,
        settings: state.settings()?,
        visible: state.is_visible(),
        uptime: state.get_uptime(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
