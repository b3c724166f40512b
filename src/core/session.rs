use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::RwLock;
use crate::core::config::Config;
use crate::core::types::{IngestionState, IngestionStatus, ParseError, Record, SessionId};
use crate::schema::schema::SchemaSnapshot;
use crate::storage::error_log::ErrorLog;
use crate::storage::record_store::RecordStore;
use crate::storage::segment::Range;

/// Counters and schema published together, so `schema.total_records`
/// always equals `state.records_loaded` within one snapshot.
#[derive(Debug, Clone)]
pub struct IngestionSnapshot {
    pub state: IngestionState,
    pub schema: Arc<SchemaSnapshot>,
}

/// Everything one open file owns. Dropped as a whole on close or replace.
///
/// The ingestion thread is the only writer; any number of readers may hold
/// an `Arc<Session>` and read while it loads.
pub struct Session {
    id: SessionId,
    label: String,
    store: Arc<RecordStore>,
    errors: ErrorLog,
    published: RwLock<IngestionSnapshot>,
    cancel: AtomicBool,
}

impl Session {
    pub fn new(label: String, config: &Config) -> Self {
        let mut state = IngestionState::idle(config.line_cap);
        let id = SessionId::new();
        state.session = Some(id);

        Session {
            id,
            label,
            store: Arc::new(RecordStore::with_cap(config.line_cap)),
            errors: ErrorLog::with_cap(config.line_cap),
            published: RwLock::new(IngestionSnapshot {
                state,
                schema: Arc::new(SchemaSnapshot::new(config.nested_flattening)),
            }),
            cancel: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Path or other name of what is being loaded.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.store.get(index)
    }

    pub fn records(&self, from: usize, to: usize) -> Range<'_, Record> {
        self.store.iterate(from, to)
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn errors(&self) -> Vec<ParseError> {
        self.errors.to_vec()
    }

    pub fn snapshot(&self) -> IngestionSnapshot {
        self.published.read().clone()
    }

    pub fn state(&self) -> IngestionState {
        self.published.read().state.clone()
    }

    pub fn status(&self) -> IngestionStatus {
        self.published.read().state.status
    }

    pub fn schema_snapshot(&self) -> Arc<SchemaSnapshot> {
        self.published.read().schema.clone()
    }

    /// Cooperative: the loader notices between line reads.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        let mut published = self.published.write();
        if !published.state.status.is_terminal() {
            published.state.cancellation_requested = true;
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub(crate) fn publish<F>(&self, update: F) -> IngestionSnapshot
    where
        F: FnOnce(&mut IngestionSnapshot),
    {
        let mut published = self.published.write();
        update(&mut published);
        published.clone()
    }
}
