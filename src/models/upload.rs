use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An image file as received from the dashboard or read from disk.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Wrap the compressed rendition of `original`, renamed with a `.jpg` extension.
    pub fn compressed_from(original: &PhotoFile, bytes: Vec<u8>) -> Self {
        let stem = Path::new(&original.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("photo");

        Self {
            file_name: format!("{stem}.jpg"),
            content_type: "image/jpeg".to_string(),
            bytes,
        }
    }
}

// Raw image bytes make the derived Debug unreadable in logs.
impl fmt::Debug for PhotoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A single photo waiting to be compressed and uploaded.
///
/// The barcode prefix and employee id are validated by whoever builds the
/// job; the queue passes them through untouched.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub photo: PhotoFile,
    pub barcode_prefix: String,
    pub employee_id: i64,
}

impl UploadJob {
    pub fn new(photo: PhotoFile, barcode_prefix: impl Into<String>, employee_id: i64) -> Self {
        Self {
            photo,
            barcode_prefix: barcode_prefix.into(),
            employee_id,
        }
    }
}

/// Body of one upload call to the remote API.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub original: PhotoFile,
    pub compressed: PhotoFile,
    pub barcode_prefix: String,
    pub employee_id: i64,
}

/// Reply from the remote single-photo upload endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl UploadResponse {
    pub fn accepted(data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            error: None,
            data,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}
