use std::sync::Arc;
use crossbeam::channel::{self, Receiver, Sender};
use serde::Serialize;
use crate::core::types::{IngestionStatus, SessionId};

/// Periodic load progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub session: SessionId,
    pub records_loaded: u64,
    pub errors_count: u64,
    pub status: IngestionStatus,
    pub percent: Option<f64>,     // Known when the file size is known
}

/// Sent exactly once per session, after the terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub session: SessionId,
    pub records_loaded: u64,
    pub errors_count: u64,
    pub capped: bool,
    pub status: IngestionStatus,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IngestEvent {
    Progress(Progress),
    Completed(Completion),
}

/// Receives notifications on the ingestion thread. Implementations must not
/// block for long; the loader waits for them.
pub trait IngestObserver: Send + Sync {
    fn on_progress(&self, progress: &Progress);
    fn on_complete(&self, completion: &Completion);
}

pub struct NoopObserver;

impl IngestObserver for NoopObserver {
    fn on_progress(&self, _progress: &Progress) {}
    fn on_complete(&self, _completion: &Completion) {}
}

impl<O: IngestObserver + ?Sized> IngestObserver for Arc<O> {
    fn on_progress(&self, progress: &Progress) {
        (**self).on_progress(progress)
    }

    fn on_complete(&self, completion: &Completion) {
        (**self).on_complete(completion)
    }
}

/// Forwards notifications over a crossbeam channel, for UIs that poll.
pub struct ChannelObserver {
    tx: Sender<IngestEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, Receiver<IngestEvent>) {
        let (tx, rx) = channel::unbounded();
        (ChannelObserver { tx }, rx)
    }
}

impl IngestObserver for ChannelObserver {
    // A dropped receiver just means nobody is listening any more
    fn on_progress(&self, progress: &Progress) {
        let _ = self.tx.send(IngestEvent::Progress(progress.clone()));
    }

    fn on_complete(&self, completion: &Completion) {
        let _ = self.tx.send(IngestEvent::Completed(completion.clone()));
    }
}
