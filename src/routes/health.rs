use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;
use crate::services::{compression::Compressor, queue::QueueSnapshot, transport::UploadTransport};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub queue: QueueSnapshot,
    pub tracked_uploads: usize,
}

/// GET /health — liveness plus current queue load.
pub async fn health_check<C: Compressor, T: UploadTransport>(
    State(state): State<AppState<C, T>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        queue: state.queue.snapshot(),
        tracked_uploads: state.tracker.len(),
    })
}
