//! Prometheus recorder and metric descriptions

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder and return its render handle
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    describe_metrics();

    info!("Metrics exporter initialized");
    Ok(handle)
}

pub fn describe_metrics() {
    metrics::describe_counter!(
        "vietsent_requests_total",
        "Classifications produced, by sentiment"
    );
    metrics::describe_histogram!(
        "vietsent_classify_latency_us",
        metrics::Unit::Microseconds,
        "Classification latency including history write"
    );
    metrics::describe_counter!(
        "vietsent_degraded_total",
        "Classifications that fell back to the lexical signal after a model failure"
    );
    metrics::describe_counter!(
        "vietsent_unknown_labels_total",
        "Model labels outside the alias table"
    );
    metrics::describe_counter!(
        "vietsent_history_trimmed_total",
        "History records removed by the retention bound"
    );
    metrics::describe_counter!(
        "vietsent_storage_errors_total",
        "Classifications that could not be recorded in history"
    );
}
