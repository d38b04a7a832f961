//! Metrics collection and exposition.
//!
//! # Metrics
//! - `greet_requests_total` (counter): requests by method, route, status
//! - `greet_request_duration_seconds` (histogram): latency by route
//! - `greet_backend_faults_total` (counter): handler faults by backend
//! - `greet_affinity_queue_depth` (gauge): pending tasks per affinity queue
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter is opt-in (`observability.metrics_enabled`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    ::metrics::counter!(
        "greet_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!("greet_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Count a handler error or panic.
pub fn record_fault(backend: &str) {
    ::metrics::counter!("greet_backend_faults_total", "backend" => backend.to_string()).increment(1);
}

/// Publish the pending task count of an affinity queue.
pub fn set_queue_depth(queue: &str, depth: usize) {
    ::metrics::gauge!("greet_affinity_queue_depth", "queue" => queue.to_string()).set(depth as f64);
}
