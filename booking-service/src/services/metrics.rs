//! Metrics collection and Prometheus export.
//!
//! HTTP metrics are recorded by `service_core::middleware::metrics`; the
//! counters below track the booking ledger itself.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Call once at startup.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_booking_created(layout: &str) {
    metrics::counter!("bookings_created_total", "layout" => layout.to_string()).increment(1);
}

pub fn record_booking_deleted() {
    metrics::counter!("bookings_deleted_total").increment(1);
}

/// `action` is one of `added`, `edited`, `deleted`.
pub fn record_payment(action: &'static str) {
    metrics::counter!("invoice_payments_total", "action" => action).increment(1);
}

pub fn record_version_conflict() {
    metrics::counter!("invoice_version_conflicts_total").increment(1);
}
