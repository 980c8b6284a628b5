use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Progress of one submitted photo as shown on the upload page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UploadStatus {
    Queued,
    Uploaded,
    Failed,
    Discarded,
}

impl UploadStatus {
    pub fn is_settled(self) -> bool {
        !matches!(self, UploadStatus::Queued)
    }
}

/// A tracked photo upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub file_name: String,
    pub barcode_prefix: String,
    pub employee_id: i64,
    pub status: UploadStatus,
    pub error: Option<String>,
    /// Whatever the remote API returned alongside a successful upload
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadRecord {
    pub fn queued(id: Uuid, file_name: &str, barcode_prefix: &str, employee_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            file_name: file_name.to_string(),
            barcode_prefix: barcode_prefix.to_string(),
            employee_id,
            status: UploadStatus::Queued,
            error: None,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}
