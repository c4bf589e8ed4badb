//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "booth_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "booth_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "booth_http_requests_in_flight";

    pub const ACCESSES_CREATED_TOTAL: &str = "booth_accesses_created_total";
    pub const COUNTERS_INCREMENTED_TOTAL: &str = "booth_counters_incremented_total";
    pub const SESSIONS_DECRYPTED_TOTAL: &str = "booth_sessions_decrypted_total";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "booth_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a new access row.
pub fn record_access_created(artist_id: u32) {
    let labels = [("artist", artist_id.to_string())];
    counter!(names::ACCESSES_CREATED_TOTAL, &labels).increment(1);
}

/// Record a counter increment.
pub fn record_counter_incremented(field: &'static str) {
    let labels = [("field", field)];
    counter!(names::COUNTERS_INCREMENTED_TOTAL, &labels).increment(1);
}

/// Record a session parameter decryption attempt.
pub fn record_session_decrypted(ok: bool) {
    let labels = [("result", if ok { "ok" } else { "invalid" })];
    counter!(names::SESSIONS_DECRYPTED_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
