use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::models::requests::ErrorResponse;
use crate::services::{compression::Compressor, transport::UploadTransport};

pub mod health;
pub mod metrics;
pub mod photos;
pub mod queue;

/// Error body returned by the JSON API.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Build the API router. `/metrics` is mounted separately by the binary.
pub fn router<C: Compressor, T: UploadTransport>(state: AppState<C, T>) -> Router {
    Router::new()
        .route("/health", get(health::health_check::<C, T>))
        .route("/api/v1/photos", post(photos::submit_photos::<C, T>))
        .route(
            "/api/v1/uploads/{upload_id}",
            get(photos::get_upload::<C, T>),
        )
        .route(
            "/api/v1/queue",
            get(queue::queue_status::<C, T>).delete(queue::clear_queue::<C, T>),
        )
        .with_state(state)
}
