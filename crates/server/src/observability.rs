use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "hero_registry_requests_total",
        "Total HTTP requests handled"
    )
    .expect("register requests_total")
});

pub static HEROES_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "hero_registry_heroes_created_total",
        "Total heroes created through the API"
    )
    .expect("register heroes_created_total")
});

pub static REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "hero_registry_request_duration_seconds",
        "Request duration in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register request_duration")
});

/// Pre/post request hook: counts every request and observes its duration.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    REQUESTS_TOTAL.inc();
    let start = Instant::now();
    let res = next.run(req).await;
    REQUEST_DURATION.observe(start.elapsed().as_secs_f64());
    res
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
