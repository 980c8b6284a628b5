//! Fake collaborators and polling helpers for upload queue tests

#![allow(dead_code)]

use booth_uploader::models::upload::{PhotoFile, UploadJob, UploadPayload, UploadResponse};
use booth_uploader::services::compression::{CompressOptions, CompressionError, Compressor};
use booth_uploader::services::transport::{TransportError, UploadTransport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};

pub const BARCODE: &str = "QX7R2";
pub const EMPLOYEE: i64 = 42;

/// Compressor that returns its input unchanged.
pub struct PassThroughCompressor;

impl Compressor for PassThroughCompressor {
    fn compress(
        &self,
        image: &[u8],
        _options: &CompressOptions,
    ) -> Result<Vec<u8>, CompressionError> {
        Ok(image.to_vec())
    }
}

/// How the fake transport should answer for a given file.
#[derive(Debug, Clone)]
pub enum Scripted {
    NetworkError(String),
    Reject(String),
}

/// Counters shared between a [`ScriptedTransport`] and the test body.
#[derive(Default)]
pub struct TransportStats {
    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl TransportStats {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn called_files(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Transport that records calls, tracks concurrency, and fails on request.
pub struct ScriptedTransport {
    stats: Arc<TransportStats>,
    gate: Option<Arc<Semaphore>>,
    delay: Duration,
    script: HashMap<String, Scripted>,
}

impl ScriptedTransport {
    pub fn new() -> (Self, Arc<TransportStats>) {
        let stats = Arc::new(TransportStats::default());
        let transport = Self {
            stats: Arc::clone(&stats),
            gate: None,
            delay: Duration::ZERO,
            script: HashMap::new(),
        };
        (transport, stats)
    }

    /// Hold every call until the returned semaphore receives a permit.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_script(mut self, file_name: &str, behaviour: Scripted) -> Self {
        self.script.insert(file_name.to_string(), behaviour);
        self
    }
}

impl UploadTransport for ScriptedTransport {
    async fn upload_one(&self, payload: UploadPayload) -> Result<UploadResponse, TransportError> {
        let file = payload.original.file_name.clone();
        self.stats.calls.lock().unwrap().push(file.clone());
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script.get(&file) {
            Some(Scripted::NetworkError(msg)) => Err(TransportError::Unavailable(msg.clone())),
            Some(Scripted::Reject(msg)) => Ok(UploadResponse::rejected(msg.clone())),
            None => Ok(UploadResponse::accepted(Some(
                serde_json::json!({ "file": file, "barcode_prefix": payload.barcode_prefix }),
            ))),
        }
    }
}

pub fn photo_name(n: usize) -> String {
    format!("photo-{n}.jpg")
}

pub fn job(n: usize) -> UploadJob {
    UploadJob::new(
        PhotoFile::new(photo_name(n), "image/jpeg", vec![0xFF, 0xD8, n as u8]),
        BARCODE,
        EMPLOYEE,
    )
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        if Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        sleep(Duration::from_millis(5)).await;
    }
}
