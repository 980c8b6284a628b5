use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

/// Install the global Prometheus recorder and register upload metrics.
pub fn install_recorder() -> Result<Arc<PrometheusHandle>, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("photo_uploads_total", "Photos submitted to the upload queue");
    metrics::describe_counter!("photo_uploads_completed", "Photos accepted by the remote API");
    metrics::describe_counter!(
        "photo_uploads_failed",
        "Photos that failed compression, transport, or were rejected"
    );
    metrics::describe_counter!(
        "photo_uploads_discarded",
        "Pending photos dropped by clearing the queue"
    );
    metrics::describe_gauge!("upload_queue_pending", "Photos waiting for a worker slot");
    metrics::describe_gauge!("upload_queue_active", "Photos currently being uploaded");
    metrics::describe_histogram!(
        "photo_upload_seconds",
        "Time to compress and upload one photo"
    );

    Ok(Arc::new(handle))
}

/// Prometheus metrics scrape endpoint.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
