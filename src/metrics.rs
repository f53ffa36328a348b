//! Prometheus metrics for request outcomes and upstream latency.
//!
//! This module provides:
//! - Request counters by outcome
//! - End-to-end request latency
//! - Per-endpoint upstream latency and timeouts

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::ServiceError;
use crate::upstream::Endpoint;

// === Metric Name Constants ===

/// Requests handled counter metric name.
pub const METRIC_REQUESTS: &str = "requests_total";
/// End-to-end request latency metric name.
pub const METRIC_REQUEST_LATENCY: &str = "request_latency_ms";
/// Upstream call latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_request_latency_ms";
/// Upstream timeouts counter metric name.
pub const METRIC_UPSTREAM_TIMEOUTS: &str = "upstream_timeouts_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_REQUESTS,
        "Total number of download requests handled, by outcome"
    );
    describe_histogram!(
        METRIC_REQUEST_LATENCY,
        "Download request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Upstream request latency in milliseconds, by endpoint"
    );
    describe_counter!(
        METRIC_UPSTREAM_TIMEOUTS,
        "Total number of upstream calls that timed out, by endpoint"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder as the global recorder.
pub fn install_prometheus() -> Result<PrometheusHandle, ServiceError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record a handled request and its latency.
pub fn record_request(start: Instant, outcome: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_REQUEST_LATENCY).record(latency_ms);
    counter!(METRIC_REQUESTS, "outcome" => outcome).increment(1);
}

/// Record upstream call latency.
pub fn record_upstream_latency(start: Instant, endpoint: Endpoint) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_UPSTREAM_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment upstream timeouts counter.
pub fn inc_upstream_timeouts(endpoint: Endpoint) {
    counter!(METRIC_UPSTREAM_TIMEOUTS, "endpoint" => endpoint.to_string()).increment(1);
}
