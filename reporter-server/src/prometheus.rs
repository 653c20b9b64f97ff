// prometheus exporter setup

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
const HTTP_REQUESTS_DURATION_SECONDS: &str = "http_requests_duration_seconds";

// Probes and scrapes would drown out the event traffic.
const UNTRACKED_PATHS: [&str; 2] = ["/_liveness", "/metrics"];

pub fn setup_metrics_recorder() -> PrometheusHandle {
    // Normalization is synchronous and in-memory, so most requests finish well
    // under a millisecond.
    const REQUEST_SECONDS: &[f64] = &[
        0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0,
    ];

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUESTS_DURATION_SECONDS.to_string()),
            REQUEST_SECONDS,
        )
        .unwrap()
        .install_recorder()
        .unwrap()
}

/// Counts and times every request except probes, labelled by route template.
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => req.uri().path().to_owned(),
    };
    if UNTRACKED_PATHS.contains(&path.as_str()) {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();

    let labels = [
        ("method", method),
        ("path", path),
        ("status", response.status().as_u16().to_string()),
    ];
    metrics::counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    metrics::histogram!(HTTP_REQUESTS_DURATION_SECONDS, &labels).record(elapsed);

    response
}
