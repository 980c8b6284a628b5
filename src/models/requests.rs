use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::queue::QueueSnapshot;

/// Metadata fields of a photo batch submission.
#[derive(Debug, Deserialize, Validate)]
pub struct UploadRequest {
    /// Customer session code printed on the barcode voucher
    #[garde(ascii, alphanumeric, length(chars, min = 5, max = 5))]
    pub barcode_prefix: String,

    #[garde(range(min = 1))]
    pub employee_id: i64,
}

/// One accepted photo in a submission response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedPhoto {
    pub upload_id: Uuid,
    pub file_name: String,
}

/// Response after submitting a batch of photos.
#[derive(Debug, Serialize)]
pub struct SubmitPhotosResponse {
    pub batch: Vec<AcceptedPhoto>,
    pub queue: QueueSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ClearQueueResponse {
    pub cleared: usize,
    pub queue: QueueSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
