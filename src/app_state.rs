use std::sync::Arc;

use crate::services::{
    compression::{Compressor, ImageCompressor},
    queue::UploadQueue,
    tracker::UploadTracker,
    transport::{HttpTransport, UploadTransport},
};

/// Shared application state passed to all route handlers.
///
/// Generic over the queue's collaborators so the router can be driven with
/// fakes; production uses the defaults.
pub struct AppState<C = ImageCompressor, T = HttpTransport> {
    pub queue: UploadQueue<C, T>,
    pub tracker: Arc<UploadTracker>,
}

impl<C, T> Clone for AppState<C, T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            tracker: Arc::clone(&self.tracker),
        }
    }
}

impl<C: Compressor, T: UploadTransport> AppState<C, T> {
    pub fn new(queue: UploadQueue<C, T>, tracker: UploadTracker) -> Self {
        Self {
            queue,
            tracker: Arc::new(tracker),
        }
    }
}
