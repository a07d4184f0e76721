//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_requests_total` (counter): requests by method, status
//! - `server_request_duration_seconds` (histogram): latency distribution
//! - `server_errors_total` (counter): error documents rendered, by status
//! - `server_component_compilations_total` (counter): cache hit/miss/uncached
//! - `server_pending_transactions` (gauge): suspended requests
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels stay low-cardinality (no paths or hosts)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "server_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("server_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_error(status: u16) {
    counter!("server_errors_total", "status" => status.to_string()).increment(1);
}

/// `outcome` is `hit`, `miss` or `uncached`.
pub fn record_compilation(outcome: &'static str) {
    counter!("server_component_compilations_total", "outcome" => outcome).increment(1);
}

pub fn set_pending(count: usize) {
    gauge!("server_pending_transactions").set(count as f64);
}
