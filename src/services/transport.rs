use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

use crate::models::upload::{PhotoFile, UploadPayload, UploadResponse};

const UPLOAD_ONE_PATH: &str = "/photos/upload-one";

/// Sends one prepared photo to the remote booth API.
///
/// `Ok` means the call completed; the remote may still have refused the
/// photo, which it reports through [`UploadResponse::success`].
pub trait UploadTransport: Send + Sync + 'static {
    fn upload_one(
        &self,
        payload: UploadPayload,
    ) -> impl Future<Output = Result<UploadResponse, TransportError>> + Send;
}

/// Multipart HTTP client for the remote single-photo upload endpoint.
pub struct HttpTransport {
    http: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpTransport {
    pub fn new(
        api_base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", api_base_url.trim_end_matches('/'), UPLOAD_ONE_PATH),
            api_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn file_part(file: PhotoFile) -> Result<Part, TransportError> {
    let part = Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.content_type)?;
    Ok(part)
}

impl UploadTransport for HttpTransport {
    async fn upload_one(&self, payload: UploadPayload) -> Result<UploadResponse, TransportError> {
        let form = Form::new()
            .part("original", file_part(payload.original)?)
            .part("compressed", file_part(payload.compressed)?)
            .text("barcode_prefix", payload.barcode_prefix)
            .text("employee_id", payload.employee_id.to_string());

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Validation failures come back as 4xx with the usual JSON envelope.
        // Any other non-2xx reply is a status error, whatever its body claims.
        match serde_json::from_str::<UploadResponse>(&body) {
            Ok(parsed) if status.is_success() || !parsed.success => Ok(parsed),
            Err(e) if status.is_success() => Err(TransportError::Decode(e)),
            _ => Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse upload response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Upload transport unavailable: {0}")]
    Unavailable(String),
}
