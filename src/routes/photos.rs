use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use std::sync::Arc;
use uuid::Uuid;

use super::{api_error, ApiError};
use crate::app_state::AppState;
use crate::models::requests::{AcceptedPhoto, SubmitPhotosResponse, UploadRequest};
use crate::models::tracking::UploadRecord;
use crate::models::upload::{PhotoFile, UploadJob};
use crate::services::{compression::Compressor, transport::UploadTransport};

/// POST /api/v1/photos — Queue a batch of photos for one barcode.
///
/// Expects `barcode_prefix` and `employee_id` text fields plus one or more
/// `photos` file parts. Uploads continue in the background; poll
/// `/api/v1/uploads/{upload_id}` for each photo's outcome.
pub async fn submit_photos<C: Compressor, T: UploadTransport>(
    State(state): State<AppState<C, T>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitPhotosResponse>), ApiError> {
    let mut barcode_prefix: Option<String> = None;
    let mut employee_id: Option<i64> = None;
    let mut photos = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("barcode_prefix") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                barcode_prefix = Some(text.trim().to_string());
            }
            Some("employee_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                let id = text.trim().parse::<i64>().map_err(|_| {
                    api_error(StatusCode::BAD_REQUEST, "employee_id must be an integer")
                })?;
                employee_id = Some(id);
            }
            Some("photos") => {
                let file_name = field.file_name().unwrap_or("photo").to_string();
                let declared_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

                let format = image::guess_format(&data).map_err(|_| {
                    api_error(
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        format!("{file_name} is not a supported image"),
                    )
                })?;
                let content_type =
                    declared_type.unwrap_or_else(|| format.to_mime_type().to_string());

                photos.push(PhotoFile::new(file_name, content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let request = UploadRequest {
        barcode_prefix: barcode_prefix
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "missing barcode_prefix"))?,
        employee_id: employee_id
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "missing employee_id"))?,
    };
    request
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    if photos.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "no photos submitted"));
    }

    let pruned = state.tracker.prune();
    if pruned > 0 {
        tracing::debug!(pruned, "Pruned settled upload records");
    }

    tracing::info!(
        barcode_prefix = %request.barcode_prefix,
        employee_id = request.employee_id,
        photos = photos.len(),
        "Queueing photo batch"
    );

    let mut batch = Vec::with_capacity(photos.len());
    for photo in photos {
        let upload_id = Uuid::new_v4();
        state.tracker.insert(UploadRecord::queued(
            upload_id,
            &photo.file_name,
            &request.barcode_prefix,
            request.employee_id,
        ));
        batch.push(AcceptedPhoto {
            upload_id,
            file_name: photo.file_name.clone(),
        });

        let handle = state.queue.enqueue(UploadJob::new(
            photo,
            request.barcode_prefix.clone(),
            request.employee_id,
        ));
        let tracker = Arc::clone(&state.tracker);
        tokio::spawn(async move {
            tracker.resolve(upload_id, handle.outcome().await);
        });
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitPhotosResponse {
            batch,
            queue: state.queue.snapshot(),
        }),
    ))
}

/// GET /api/v1/uploads/{upload_id} — Check one photo's upload status.
pub async fn get_upload<C: Compressor, T: UploadTransport>(
    State(state): State<AppState<C, T>>,
    Path(upload_id): Path<Uuid>,
) -> Result<Json<UploadRecord>, ApiError> {
    state
        .tracker
        .get(upload_id)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("unknown upload {upload_id}")))
}
