use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

use crate::parking::{SpotStatus, SpotsByStatus};

/// Metric name prefix for all ParkingHub metrics
const PREFIX: &str = "parkinghub";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    pub static ref AUTH_LOGIN_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_auth_login_duration_seconds"),
            "Login request duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0])
    ).expect("Failed to create auth_login_duration_seconds metric");

    // Marketplace Metrics
    pub static ref BOOKING_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_booking_outcomes_total"), "Booking attempts by outcome"),
        &["outcome"]
    ).expect("Failed to create booking_outcomes_total metric");

    pub static ref LIFECYCLE_TRANSITIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_lifecycle_transitions_total"),
            "Bookings advanced by the lifecycle sweep"
        ),
        &["to"]
    ).expect("Failed to create lifecycle_transitions_total metric");

    pub static ref SPOTS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_spots_total"), "Parking spots by approval status"),
        &["status"]
    ).expect("Failed to create spots_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already-registered errors are expected when tests call this repeatedly
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(BOOKING_OUTCOMES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(LIFECYCLE_TRANSITIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SPOTS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Maps a request path onto its route shape so ids don't explode label cardinality.
pub fn normalize_path_label(path: &str) -> String {
    if path.starts_with("/uploads/") {
        return "/uploads/{file}".to_string();
    }
    if !path.starts_with("/api") {
        return if path == "/" { "/" } else { "static" }.to_string();
    }
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a login attempt
pub fn record_login_attempt(status: &str, duration: Duration) {
    AUTH_LOGIN_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();

    AUTH_LOGIN_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record the outcome of a booking attempt ("created", "conflict", ...)
pub fn record_booking_outcome(outcome: &str) {
    BOOKING_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_lifecycle_sweep(activated: usize, completed: usize) {
    LIFECYCLE_TRANSITIONS_TOTAL
        .with_label_values(&["active"])
        .inc_by(activated as f64);
    LIFECYCLE_TRANSITIONS_TOTAL
        .with_label_values(&["completed"])
        .inc_by(completed as f64);
}

pub fn set_spot_counts(counts: &SpotsByStatus) {
    for status in SpotStatus::ALL {
        SPOTS_TOTAL
            .with_label_values(&[status.as_str()])
            .set(counts.get(status) as f64);
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
