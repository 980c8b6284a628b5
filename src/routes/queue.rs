use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::models::requests::ClearQueueResponse;
use crate::services::{compression::Compressor, queue::QueueSnapshot, transport::UploadTransport};

/// GET /api/v1/queue — Pending and in-flight upload counts.
pub async fn queue_status<C: Compressor, T: UploadTransport>(
    State(state): State<AppState<C, T>>,
) -> Json<QueueSnapshot> {
    Json(state.queue.snapshot())
}

/// DELETE /api/v1/queue — Drop photos that have not started uploading.
pub async fn clear_queue<C: Compressor, T: UploadTransport>(
    State(state): State<AppState<C, T>>,
) -> Json<ClearQueueResponse> {
    let cleared = state.queue.clear();
    Json(ClearQueueResponse {
        cleared,
        queue: state.queue.snapshot(),
    })
}
