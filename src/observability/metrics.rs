//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, status and outcome
//! - `edge_request_duration_seconds` (histogram): time to response head
//! - `edge_forward_errors_total` (counter): failures by error kind
//!
//! # Design Decisions
//! - Labels are bounded sets; the subdomain comes from the client's Host
//!   header and is logged, never used as a label
//! - Recording without an installed exporter is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::forwarder::ErrorKind;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one handled request. `outcome` is `forwarded`, `unrouted` or an
/// error kind label.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!("edge_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record a forwarding failure.
pub fn record_error(kind: ErrorKind) {
    metrics::counter!("edge_forward_errors_total", "kind" => kind.as_str()).increment(1);
}
