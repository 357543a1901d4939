//! HTTP API module
//!
//! The presentation hooks consumed by the UI layer: timer controls, the
//! formatted display, settings, and page visibility.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer", get(timer_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/toggle", post(toggle_handler))
        .route("/timer/mode/:mode", post(mode_handler))
        .route("/timer/minimize", post(minimize_handler))
        .route("/timer/position", put(position_handler))
        .route("/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/visibility", post(visibility_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::CompletionNotifier,
        store::{InstanceId, MemoryStore, TimerStore},
        test_support::RecordingNotifier,
        utils::{Clock, ManualClock},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let state = Arc::new(AppState::new(
            TimerStore::new(Arc::new(MemoryStore::new()), InstanceId::new()),
            Arc::new(RecordingNotifier::default()) as Arc<dyn CompletionNotifier>,
            Arc::new(ManualClock::new(1_700_000_000_000)) as Arc<dyn Clock>,
        ));
        create_router(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn reports_formatted_display() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/timer", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timer"]["display"], "25:00");
        assert_eq!(body["timer"]["mode"], "focus");
        assert_eq!(body["status"], "paused");
    }

    #[tokio::test]
    async fn start_pause_and_switch_mode() {
        let app = app();

        let (_, body) = call(&app, Method::POST, "/timer/start", None).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["timer"]["action_label"], "Pause");

        let (_, body) = call(&app, Method::POST, "/timer/pause", None).await;
        assert_eq!(body["timer"]["is_running"], false);

        let (status, body) = call(&app, Method::POST, "/timer/mode/long_break", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timer"]["display"], "15:00");
    }

    #[tokio::test]
    async fn unknown_mode_is_bad_request() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/timer/mode/pomodoro", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn settings_override_merges_over_defaults() {
        let app = app();
        let (status, body) = call(&app, Method::PUT, "/settings", Some(r#"{"short_break":600}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["short_break"], 600);
        assert_eq!(body["focus"], 1500);
        assert_eq!(body["long_break"], 900);

        let (_, body) = call(&app, Method::POST, "/timer/mode/short_break", None).await;
        assert_eq!(body["timer"]["display"], "10:00");
    }

    #[tokio::test]
    async fn position_and_visibility_round_trip() {
        let app = app();
        let (_, body) = call(&app, Method::PUT, "/timer/position", Some(r#"{"x":12,"y":34}"#)).await;
        assert_eq!(body["timer"]["position"]["x"], 12);

        let (_, body) = call(&app, Method::POST, "/visibility", Some(r#"{"visible":false}"#)).await;
        assert_eq!(body["message"], "Instance in background");

        let (_, body) = call(&app, Method::GET, "/status", None).await;
        assert_eq!(body["visible"], false);
        assert_eq!(body["last_action"], "position");
    }
}
