use serde::Deserialize;
use std::time::Duration;

use crate::services::compression::CompressOptions;
use crate::services::queue::QueueConfig;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Ignored by the import CLI.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the remote booth REST API
    pub api_base_url: String,

    /// Bearer token for the remote API
    #[serde(default)]
    pub api_token: Option<String>,

    /// Maximum number of photo uploads in flight at once
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Cap on queued (not yet started) uploads. Unbounded when unset.
    #[serde(default)]
    pub max_pending_uploads: Option<usize>,

    /// Target size of a compressed photo, in bytes
    #[serde(default = "default_compress_max_bytes")]
    pub compress_max_bytes: u64,

    /// Target longest edge of a compressed photo, in pixels
    #[serde(default = "default_compress_max_dimension")]
    pub compress_max_dimension: u32,

    /// Per-request timeout for calls to the remote API
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Largest accepted multipart submission
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit_bytes: usize,

    /// How long settled upload records stay queryable
    #[serde(default = "default_tracker_retention_secs")]
    pub tracker_retention_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_upload_concurrency() -> usize {
    6
}

fn default_compress_max_bytes() -> u64 {
    1024 * 1024
}

fn default_compress_max_dimension() -> u32 {
    1920
}

fn default_http_timeout_secs() -> u64 {
    60
}

fn default_request_body_limit() -> usize {
    100 * 1024 * 1024
}

fn default_tracker_retention_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_concurrency: self.upload_concurrency,
            max_pending: self.max_pending_uploads,
            compress: CompressOptions {
                max_size_bytes: self.compress_max_bytes,
                max_dimension: self.compress_max_dimension,
                ..CompressOptions::default()
            },
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn tracker_retention(&self) -> Duration {
        Duration::from_secs(self.tracker_retention_secs)
    }
}
