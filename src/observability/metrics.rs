//! Metrics collection and exposition.
//!
//! # Exposed metrics
//! - `apphost_resource_healthy` (gauge, per resource): 1 healthy, 0 not
//! - `apphost_probes_total` (counter, per resource and result)
//! - `apphost_restarts_total` (counter, per resource)
//! - `apphost_time_to_ready_seconds` (histogram, per resource)

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
///
/// Failure is logged, not fatal: the host runs fine without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }

    describe_gauge!(
        "apphost_resource_healthy",
        "Whether a resource currently reports healthy (1) or not (0)"
    );
    describe_counter!("apphost_probes_total", "Health probes performed");
    describe_counter!("apphost_restarts_total", "Process restarts performed");
    describe_histogram!(
        "apphost_time_to_ready_seconds",
        "Time from process start to first ready report"
    );
}

pub fn record_resource_health(resource: &str, healthy: bool) {
    gauge!("apphost_resource_healthy", "resource" => resource.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe(resource: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!(
        "apphost_probes_total",
        "resource" => resource.to_string(),
        "result" => result
    )
    .increment(1);
}

pub fn record_restart(resource: &str) {
    counter!("apphost_restarts_total", "resource" => resource.to_string()).increment(1);
}

pub fn record_time_to_ready(resource: &str, elapsed: Duration) {
    histogram!("apphost_time_to_ready_seconds", "resource" => resource.to_string())
        .record(elapsed.as_secs_f64());
}
