//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by route family,
//!   method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_upstream_responses_total` (counter): upstream statuses relayed
//! - `gateway_upstream_failures_total` (counter): transport failures by kind
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations behind the metrics facade)
//! - The Prometheus exporter runs on its own listener, never on the
//!   gateway's own port

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record one completed inbound request.
pub fn record_request(family: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "family" => family.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record the status of a structured upstream response being relayed.
pub fn record_upstream_status(status: u16) {
    metrics::counter!(
        "gateway_upstream_responses_total",
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Record an upstream call that produced no structured response.
pub fn record_upstream_failure(kind: &'static str) {
    metrics::counter!("gateway_upstream_failures_total", "kind" => kind).increment(1);
}
