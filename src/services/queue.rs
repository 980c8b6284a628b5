use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::models::upload::{PhotoFile, UploadJob, UploadPayload, UploadResponse};
use crate::services::compression::{CompressOptions, CompressionError, Compressor};
use crate::services::transport::{TransportError, UploadTransport};

/// Settled result of one queued upload.
pub type UploadResult = Result<UploadResponse, UploadError>;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of uploads in flight. Zero is treated as one.
    pub max_concurrency: usize,
    /// Cap on pending jobs; `None` leaves the pending list unbounded.
    pub max_pending: Option<usize>,
    pub compress: CompressOptions,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 6,
            max_pending: None,
            compress: CompressOptions::default(),
        }
    }
}

/// Point-in-time view of the queue for progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub pending: usize,
    pub active: usize,
    pub max_concurrency: usize,
}

/// Receives the outcome of one enqueued upload.
#[derive(Debug)]
pub struct UploadHandle {
    rx: oneshot::Receiver<UploadResult>,
}

impl UploadHandle {
    /// Wait for the upload to settle.
    ///
    /// Returns `None` when the job was removed by [`UploadQueue::clear`]
    /// before a worker picked it up.
    pub async fn outcome(self) -> Option<UploadResult> {
        self.rx.await.ok()
    }
}

struct PendingJob {
    job: UploadJob,
    reply: oneshot::Sender<UploadResult>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingJob>,
    active: usize,
}

struct Shared<C, T> {
    state: Mutex<QueueState>,
    max_concurrency: usize,
    max_pending: Option<usize>,
    compress: CompressOptions,
    compressor: Arc<C>,
    transport: T,
    runtime: Handle,
}

/// FIFO photo upload queue with a fixed number of concurrent workers.
///
/// Each worker compresses its photo, then hands the original and compressed
/// renditions to the transport. Finishing a job frees its slot and pulls the
/// next pending job, so the queue drains without any polling.
pub struct UploadQueue<C, T> {
    shared: Arc<Shared<C, T>>,
}

impl<C, T> Clone for UploadQueue<C, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Compressor, T: UploadTransport> UploadQueue<C, T> {
    /// Must be called from within a Tokio runtime; workers are spawned onto it.
    pub fn new(config: QueueConfig, compressor: C, transport: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                max_concurrency: config.max_concurrency.max(1),
                max_pending: config.max_pending,
                compress: config.compress,
                compressor: Arc::new(compressor),
                transport,
                runtime: Handle::current(),
            }),
        }
    }

    /// Append a job to the pending list and start it if a slot is free.
    pub fn enqueue(&self, job: UploadJob) -> UploadHandle {
        let (reply, rx) = oneshot::channel();
        metrics::counter!("photo_uploads_total").increment(1);

        {
            let mut state = self.lock();
            if let Some(limit) = self.shared.max_pending {
                if state.pending.len() >= limit {
                    tracing::warn!(
                        file = %job.photo.file_name,
                        limit,
                        "Upload queue full, rejecting photo"
                    );
                    metrics::counter!("photo_uploads_failed").increment(1);
                    let _ = reply.send(Err(UploadError::QueueFull { limit }));
                    return UploadHandle { rx };
                }
            }
            state.pending.push_back(PendingJob { job, reply });
        }

        self.try_dispatch();
        UploadHandle { rx }
    }

    /// Drop every job that has not started yet. In-flight uploads keep running.
    pub fn clear(&self) -> usize {
        let dropped: Vec<PendingJob> = {
            let mut state = self.lock();
            let dropped = state.pending.drain(..).collect();
            record_depth(&state);
            dropped
        };

        if !dropped.is_empty() {
            tracing::info!(cleared = dropped.len(), "Cleared pending uploads");
            metrics::counter!("photo_uploads_discarded").increment(dropped.len() as u64);
        }
        dropped.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.lock().active
    }

    pub fn max_concurrency(&self) -> usize {
        self.shared.max_concurrency
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.lock();
        QueueSnapshot {
            pending: state.pending.len(),
            active: state.active,
            max_concurrency: self.shared.max_concurrency,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // No code panics while holding the lock, so a poisoned state is still consistent.
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move jobs from the head of the pending list into free worker slots.
    ///
    /// Called after every enqueue and whenever a worker releases its slot.
    fn try_dispatch(&self) {
        let started: Vec<PendingJob> = {
            let mut state = self.lock();
            let mut started = Vec::new();
            while state.active < self.shared.max_concurrency {
                let Some(next) = state.pending.pop_front() else {
                    break;
                };
                state.active += 1;
                started.push(next);
            }
            record_depth(&state);
            started
        };

        for pending in started {
            let queue = self.clone();
            self.shared.runtime.spawn(async move {
                let _slot = ActiveSlot {
                    queue: queue.clone(),
                };
                queue.run_worker(pending).await;
            });
        }
    }

    fn release_slot(&self) {
        {
            let mut state = self.lock();
            state.active = state.active.saturating_sub(1);
            record_depth(&state);
        }
        self.try_dispatch();
    }

    async fn run_worker(&self, pending: PendingJob) {
        let PendingJob { job, reply } = pending;
        let file_name = job.photo.file_name.clone();
        let barcode_prefix = job.barcode_prefix.clone();
        let employee_id = job.employee_id;
        let start = Instant::now();

        tracing::debug!(file = %file_name, %barcode_prefix, employee_id, "Starting photo upload");

        // A child task turns a panicking collaborator into a failed outcome
        // instead of a dropped reply.
        let queue = self.clone();
        let result = match self
            .shared
            .runtime
            .spawn(async move { queue.process(job).await })
            .await
        {
            Ok(result) => result,
            Err(e) => Err(UploadError::Worker(e.to_string())),
        };
        metrics::histogram!("photo_upload_seconds").record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                metrics::counter!("photo_uploads_completed").increment(1);
                tracing::info!(
                    file = %file_name,
                    %barcode_prefix,
                    employee_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Photo uploaded"
                );
            }
            Err(e) => {
                metrics::counter!("photo_uploads_failed").increment(1);
                tracing::warn!(
                    file = %file_name,
                    %barcode_prefix,
                    employee_id,
                    error = %e,
                    "Photo upload failed"
                );
            }
        }

        // The caller may have dropped its handle.
        let _ = reply.send(result);
    }

    async fn process(&self, job: UploadJob) -> UploadResult {
        let UploadJob {
            photo,
            barcode_prefix,
            employee_id,
        } = job;

        let compressor = Arc::clone(&self.shared.compressor);
        let options = self.shared.compress.clone();
        let (photo, compressed) = tokio::task::spawn_blocking(move || {
            let compressed = compressor.compress(&photo.bytes, &options);
            (photo, compressed)
        })
        .await
        .map_err(|e| UploadError::Worker(e.to_string()))?;

        let compressed = PhotoFile::compressed_from(&photo, compressed?);
        let payload = UploadPayload {
            original: photo,
            compressed,
            barcode_prefix,
            employee_id,
        };

        let response = self.shared.transport.upload_one(payload).await?;
        if response.success {
            Ok(response)
        } else {
            Err(UploadError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "upload rejected by remote API".to_string()),
            ))
        }
    }
}

/// Frees a worker slot when the worker finishes, including by panic.
struct ActiveSlot<C: Compressor, T: UploadTransport> {
    queue: UploadQueue<C, T>,
}

impl<C: Compressor, T: UploadTransport> Drop for ActiveSlot<C, T> {
    fn drop(&mut self) {
        self.queue.release_slot();
    }
}

fn record_depth(state: &QueueState) {
    metrics::gauge!("upload_queue_pending").set(state.pending.len() as f64);
    metrics::gauge!("upload_queue_active").set(state.active as f64);
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Compression failed: {0}")]
    Compression(#[from] CompressionError),

    #[error("Upload failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Upload queue is full ({limit} photos waiting)")]
    QueueFull { limit: usize },

    #[error("Upload worker crashed: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Semaphore;

    struct PassThrough;

    impl Compressor for PassThrough {
        fn compress(
            &self,
            image: &[u8],
            _options: &CompressOptions,
        ) -> Result<Vec<u8>, CompressionError> {
            Ok(image.to_vec())
        }
    }

    /// Holds every upload until the test adds permits.
    struct Gated {
        gate: Arc<Semaphore>,
    }

    impl UploadTransport for Gated {
        async fn upload_one(
            &self,
            _payload: UploadPayload,
        ) -> Result<UploadResponse, TransportError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| TransportError::Unavailable(e.to_string()))?;
            permit.forget();
            Ok(UploadResponse::accepted(None))
        }
    }

    fn job(n: usize) -> UploadJob {
        UploadJob::new(
            PhotoFile::new(format!("photo-{n}.jpg"), "image/jpeg", vec![n as u8]),
            "AB123",
            7,
        )
    }

    fn gated_queue(config: QueueConfig) -> (UploadQueue<PassThrough, Gated>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Gated {
            gate: Arc::clone(&gate),
        };
        (UploadQueue::new(config, PassThrough, transport), gate)
    }

    #[tokio::test]
    async fn test_enqueue_fills_slots_synchronously() {
        let (queue, gate) = gated_queue(QueueConfig {
            max_concurrency: 2,
            ..QueueConfig::default()
        });

        let handles: Vec<_> = (0..5).map(|n| queue.enqueue(job(n))).collect();
        assert_eq!(
            queue.snapshot(),
            QueueSnapshot {
                pending: 3,
                active: 2,
                max_concurrency: 2
            }
        );

        gate.add_permits(5);
        for handle in handles {
            assert!(handle.outcome().await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        let (queue, gate) = gated_queue(QueueConfig {
            max_concurrency: 0,
            ..QueueConfig::default()
        });
        assert_eq!(queue.max_concurrency(), 1);

        let handle = queue.enqueue(job(0));
        assert_eq!(queue.active_count(), 1);
        gate.add_permits(1);
        assert!(handle.outcome().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_max_pending_rejects_overflow() {
        let (queue, gate) = gated_queue(QueueConfig {
            max_concurrency: 1,
            max_pending: Some(1),
            ..QueueConfig::default()
        });

        let running = queue.enqueue(job(0));
        let waiting = queue.enqueue(job(1));
        let overflow = queue.enqueue(job(2));

        match overflow.outcome().await {
            Some(Err(UploadError::QueueFull { limit })) => assert_eq!(limit, 1),
            other => panic!("expected QueueFull, got {other:?}"),
        }
        assert_eq!(queue.pending_count(), 1);

        gate.add_permits(2);
        assert!(running.outcome().await.unwrap().is_ok());
        assert!(waiting.outcome().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_clear_reports_dropped_count() {
        let (queue, gate) = gated_queue(QueueConfig {
            max_concurrency: 1,
            ..QueueConfig::default()
        });

        let running = queue.enqueue(job(0));
        let dropped = queue.enqueue(job(1));
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.clear(), 0);

        assert!(dropped.outcome().await.is_none());
        gate.add_permits(1);
        assert!(running.outcome().await.unwrap().is_ok());
    }
}
