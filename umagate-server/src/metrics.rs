//! Prometheus metrics collection for the gate server

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use umagate_core::GateError;

/// Initialize all metric descriptions
pub fn init_metrics() {
    describe_counter!(
        "umagate_requests_total",
        "Total number of gated requests by outcome"
    );
    describe_counter!(
        "umagate_errors_total",
        "Total number of rejected requests by error kind"
    );
    describe_histogram!(
        "umagate_authorization_latency_seconds",
        "Time spent deciding a request, including the policy query"
    );
    describe_gauge!(
        "umagate_degraded",
        "1 when the gate is missing required configuration"
    );
}

/// Record a request the gate let through
pub fn record_granted(latency_seconds: f64) {
    counter!("umagate_requests_total", "outcome" => "granted").increment(1);
    histogram!("umagate_authorization_latency_seconds").record(latency_seconds);
}

/// Record a request the gate rejected
pub fn record_rejected(error: &GateError, latency_seconds: f64) {
    counter!("umagate_requests_total", "outcome" => "rejected").increment(1);
    counter!("umagate_errors_total", "kind" => error.kind()).increment(1);
    histogram!("umagate_authorization_latency_seconds").record(latency_seconds);
}

/// Publish the gate's health
pub fn set_degraded(degraded: bool) {
    gauge!("umagate_degraded").set(if degraded { 1.0 } else { 0.0 });
}

/// Storage for Prometheus handle
static PROMETHEUS_HANDLE: std::sync::OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    std::sync::OnceLock::new();

/// Install the Prometheus recorder
pub fn init_prometheus() -> anyhow::Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder()?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Failed to set Prometheus handle"))?;
    Ok(())
}

/// Get Prometheus metrics string
pub fn get_prometheus_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Prometheus metrics not initialized\n".to_string())
}
