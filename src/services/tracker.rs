use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use crate::models::tracking::{UploadRecord, UploadStatus};
use crate::services::queue::UploadResult;

/// In-memory index of submitted photos and how their uploads ended.
pub struct UploadTracker {
    records: Mutex<HashMap<Uuid, UploadRecord>>,
    retention: Duration,
}

impl UploadTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            retention,
        }
    }

    pub fn insert(&self, record: UploadRecord) {
        self.lock().insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<UploadRecord> {
        self.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Record the outcome delivered by an upload handle.
    ///
    /// `None` means the photo was cleared from the queue before it started.
    pub fn resolve(&self, id: Uuid, outcome: Option<UploadResult>) {
        let mut records = self.lock();
        let Some(record) = records.get_mut(&id) else {
            tracing::debug!(upload_id = %id, "Outcome for unknown or pruned upload");
            return;
        };

        match outcome {
            Some(Ok(response)) => {
                record.status = UploadStatus::Uploaded;
                record.result = response.data;
            }
            Some(Err(e)) => {
                record.status = UploadStatus::Failed;
                record.error = Some(e.to_string());
            }
            None => {
                record.status = UploadStatus::Discarded;
            }
        }
        record.updated_at = Utc::now();
        tracing::debug!(upload_id = %id, status = %record.status, "Upload record settled");
    }

    /// Drop settled records older than the retention window.
    pub fn prune(&self) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(self.retention)
            .ok()
            .and_then(|retention| Utc::now().checked_sub_signed(retention))
        else {
            return 0;
        };

        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, r| !r.status.is_settled() || r.updated_at > cutoff);
        before - records.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, UploadRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
