//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forwarder_requests_total` (counter): proxied requests by method, status
//! - `forwarder_request_duration_seconds` (histogram): end-to-end latency
//! - `forwarder_rewritten_bytes_total` (counter): bytes of rewritten bodies
//! - `forwarder_bypassed_responses_total` (counter): excluded-extension passes

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "forwarder_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("forwarder_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a body that went through the rewrite pipeline.
pub fn record_rewrite(bytes: usize) {
    metrics::counter!("forwarder_rewritten_bytes_total").increment(bytes as u64);
}

/// Record a response passed through because of its extension.
pub fn record_bypass() {
    metrics::counter!("forwarder_bypassed_responses_total").increment(1);
}
