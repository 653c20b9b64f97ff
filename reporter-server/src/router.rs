use std::future::ready;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use reporter::api::Completion;
use reporter::events::AnalyticsEvent;
use reporter::reporter::AnalyticsReporter;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::ApiError;
use crate::prometheus::{setup_metrics_recorder, track_metrics};

pub type SharedReporter = Arc<dyn AnalyticsReporter + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    /// `None` when reporting is disabled.
    pub reporter: Option<SharedReporter>,
}

async fn index() -> &'static str {
    "analytics reporter"
}

async fn liveness() -> &'static str {
    "ok"
}

/// Any valid JSON body is accepted and acknowledged, whatever the reporter
/// makes of it.
#[instrument(skip_all, fields(body_size = body.len()))]
async fn event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Completion>, ApiError> {
    let value: Value = serde_json::from_slice(&body)?;
    let event = AnalyticsEvent::from_json(value);

    match &state.reporter {
        Some(reporter) => Ok(Json(reporter.process_event(event.as_ref()))),
        None => Ok(Json(Completion::succeeded())),
    }
}

pub fn router(reporter: Option<SharedReporter>, metrics: bool) -> Router {
    let state = AppState { reporter };

    let router = Router::new()
        .route("/", get(index))
        .route("/_liveness", get(liveness))
        .route("/event", post(event))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Don't install metrics unless asked to
    // Installing a global recorder when used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();

        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
