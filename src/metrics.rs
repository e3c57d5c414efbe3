//! Prometheus metrics

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Setup Prometheus metrics exporter
/// Returns a handle that can be used to retrieve metrics
pub fn setup_metrics() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!("Prometheus metrics exporter installed");

    Ok(handle)
}

/// Record a served prediction
pub fn record_prediction(id: &str, label: &str) {
    metrics::counter!("text_pipeliner_predictions_total",
        "id" => id.to_string(),
        "label" => label.to_string()
    )
    .increment(1);
}

/// Record a failed prediction
pub fn record_prediction_failure(id: &str, reason: &'static str) {
    metrics::counter!("text_pipeliner_prediction_failures_total",
        "id" => id.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a register listing request
pub fn record_register_request(filtered: bool) {
    metrics::counter!("text_pipeliner_register_requests_total",
        "filtered" => filtered.to_string()
    )
    .increment(1);
}

/// Update loaded model gauge
pub fn update_loaded_models(count: usize) {
    metrics::gauge!("text_pipeliner_loaded_models").set(count as f64);
}
