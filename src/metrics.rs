//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Upstream (provider) metrics
    pub static ref UPSTREAM_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("actgate_upstream_requests_total", "Total number of requests sent to the provider"),
        &["operation", "outcome"]
    ).expect("metric can be created");
    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "actgate_upstream_request_duration_seconds",
            "Provider request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"]
    ).expect("metric can be created");
    pub static ref PROXY_RETRIES_TOTAL: IntCounter = IntCounter::new(
        "actgate_proxy_retries_total",
        "Total number of proxied requests retried after a transport failure"
    ).expect("metric can be created");

    // Session metrics
    pub static ref SESSIONS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "actgate_sessions_created_total",
        "Total number of sessions created"
    ).expect("metric can be created");
    pub static ref SESSION_TOKENS_ISSUED_TOTAL: IntCounter = IntCounter::new(
        "actgate_session_tokens_issued_total",
        "Total number of session tokens issued"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("actgate_errors_total", "Total number of errors returned to clients"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(UPSTREAM_REQUESTS_TOTAL.clone()))
            .expect("UPSTREAM_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()))
            .expect("UPSTREAM_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(PROXY_RETRIES_TOTAL.clone()))
            .expect("PROXY_RETRIES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(SESSIONS_CREATED_TOTAL.clone()))
            .expect("SESSIONS_CREATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(SESSION_TOKENS_ISSUED_TOTAL.clone()))
            .expect("SESSION_TOKENS_ISSUED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Record one provider call.
///
/// `outcome` is a coarse label such as "success", "conflict",
/// "http_error" or "transport_error".
pub fn observe_upstream(operation: &str, outcome: &str, elapsed: Duration) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}
