use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::session::Session;
use crate::core::stats::SessionStats;
use crate::core::types::{IngestionState, ParseError, Record};
use crate::query::cache::CacheStats;
use crate::query::executor::{QueryEngine, QueryMatches};
use crate::query::types::{MatchMode, QuerySpec};
use crate::reader::line_source::LineFeed;
use crate::schema::schema::SchemaSnapshot;
use crate::storage::record_store::RecordStore;
use crate::writer::export::export_jsonl;
use crate::writer::ingest_writer::{FeedSource, IngestHandle, IngestWriter};
use crate::writer::observer::{IngestObserver, NoopObserver};

/// Entry point: one open file at a time, readable while it loads.
///
/// Opening a new file cancels and drains the previous load before anything
/// of the new one becomes visible. Readers that need to outlive a borrow of
/// the explorer can take an `Arc<Session>` from [`Explorer::session`].
pub struct Explorer {
    config: Config,
    observer: Arc<dyn IngestObserver>,
    current: Option<IngestHandle>,
    engine: QueryEngine,
    empty: Arc<RecordStore>,
}

impl Explorer {
    pub fn new(config: Config) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: Config, observer: Arc<dyn IngestObserver>) -> Self {
        let engine = QueryEngine::new(config.query_cache_size);
        Explorer {
            config,
            observer,
            current: None,
            engine,
            empty: Arc::new(RecordStore::unbounded()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts loading `path` in the background and returns immediately.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<Arc<Session>> {
        let path = path.as_ref();
        self.start(path.display().to_string(), FeedSource::Path(path.to_path_buf()))
    }

    /// Same as `open` for lines that do not come from a file.
    pub fn open_feed(&mut self, label: impl Into<String>, feed: Box<dyn LineFeed>) -> Result<Arc<Session>> {
        self.start(label.into(), FeedSource::Feed(feed))
    }

    fn start(&mut self, label: String, source: FeedSource) -> Result<Arc<Session>> {
        self.close();

        let session = Arc::new(Session::new(label, &self.config));
        let handle = IngestWriter::new(session.clone(), &self.config, self.observer.clone()).spawn(source)?;
        self.current = Some(handle);
        Ok(session)
    }

    /// Requests cancellation; returns at once. Use `wait` to drain.
    pub fn cancel(&self) {
        if let Some(handle) = &self.current {
            handle.cancel();
        }
    }

    /// Blocks until the current load reaches a terminal state.
    pub fn wait(&mut self) -> Result<IngestionState> {
        match &mut self.current {
            Some(handle) => handle.join(),
            None => Ok(IngestionState::idle(self.config.line_cap)),
        }
    }

    /// Cancels, drains and drops the current session.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.cancel();
            if let Err(e) = handle.join() {
                warn!(session = %handle.session().id(), error = %e, "ingestion ended abnormally");
            }
            info!(session = %handle.session().id(), "session closed");
        }
        self.engine.clear_cache();
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.current.as_ref().map(|handle| handle.session().clone())
    }

    pub fn state(&self) -> IngestionState {
        match &self.current {
            Some(handle) => handle.session().state(),
            None => IngestionState::idle(self.config.line_cap),
        }
    }

    pub fn len(&self) -> usize {
        self.current.as_ref().map_or(0, |handle| handle.session().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.current.as_ref()?.session().get(index)
    }

    /// Records in `[from, to)` as loaded so far.
    pub fn records(&self, from: usize, to: usize) -> Vec<&Record> {
        match &self.current {
            Some(handle) => handle.session().records(from, to).collect(),
            None => Vec::new(),
        }
    }

    pub fn schema_snapshot(&self) -> Arc<SchemaSnapshot> {
        match &self.current {
            Some(handle) => handle.session().schema_snapshot(),
            None => Arc::new(SchemaSnapshot::new(self.config.nested_flattening)),
        }
    }

    pub fn errors(&self) -> Vec<ParseError> {
        self.current
            .as_ref()
            .map_or_else(Vec::new, |handle| handle.session().errors())
    }

    fn store(&self) -> &Arc<RecordStore> {
        match &self.current {
            Some(handle) => handle.session().store(),
            None => &self.empty,
        }
    }

    /// Lazy ascending matches over the records loaded when the call is made.
    pub fn query(&self, spec: &QuerySpec) -> Result<QueryMatches> {
        QueryEngine::query(self.store(), spec)
    }

    /// `query` with the configured case flag.
    pub fn search(&self, pattern: &str, mode: MatchMode) -> Result<QueryMatches> {
        let spec = QuerySpec {
            pattern: pattern.to_string(),
            mode,
            field: None,
            case_sensitive: self.config.case_sensitive,
        };
        self.query(&spec)
    }

    /// All matches at once, scanned in parallel and memoised.
    pub fn query_all(&self, spec: &QuerySpec) -> Result<Arc<Vec<usize>>> {
        match &self.current {
            Some(handle) => {
                let session = handle.session();
                self.engine.query_all(session.id(), session.store(), spec)
            }
            None => QueryEngine::query(&self.empty, spec).map(|m| Arc::new(m.collect())),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache_stats()
    }

    pub fn stats(&self) -> Option<SessionStats> {
        let handle = self.current.as_ref()?;
        Some(SessionStats::from_snapshot(&handle.session().snapshot()))
    }

    /// Writes every record matching `spec` as JSON Lines.
    pub fn export_jsonl<W: Write>(&self, spec: &QuerySpec, writer: W) -> Result<usize> {
        let matches = self.query(spec)?;
        export_jsonl(self.store(), matches, writer)
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.close();
    }
}
