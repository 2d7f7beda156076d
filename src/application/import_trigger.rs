//! Hand-off from the poller to the importer.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// One detected export update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// Sync folder the update was seen in.
    pub folder: PathBuf,
    /// Export document to decode.
    pub export_file: PathBuf,
    pub detected_at: DateTime<Utc>,
}

/// Receives import requests from a poll tick.
///
/// Implementations must not block; the tick runs on the timer task.
pub trait ImportTrigger: Send {
    fn trigger(&self, request: ImportRequest);
}

/// Trigger that enqueues requests on an unbounded channel.
#[derive(Debug, Clone)]
pub struct QueueTrigger {
    tx: mpsc::UnboundedSender<ImportRequest>,
}

impl QueueTrigger {
    /// New trigger plus the receiving end of its queue.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ImportRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ImportTrigger for QueueTrigger {
    fn trigger(&self, request: ImportRequest) {
        tracing::debug!(file = %request.export_file.display(), "Import queued");
        if self.tx.send(request).is_err() {
            tracing::warn!("Import queue closed; request dropped");
        }
    }
}
