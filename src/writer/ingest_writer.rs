use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use chrono::Utc;
use tracing::{debug, info, trace, warn};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::session::Session;
use crate::core::types::{IngestionState, IngestionStatus};
use crate::reader::decoder::{decode_line, Decoded};
use crate::reader::line_source::{LineFeed, LineSource, ReadProgress, SourceLine};
use crate::schema::schema::SchemaInferencer;
use crate::writer::observer::{Completion, IngestObserver, Progress};

/// Where a session's lines come from. Paths are opened on the ingestion
/// thread so a missing file fails the session instead of the caller.
pub enum FeedSource {
    Path(PathBuf),
    Feed(Box<dyn LineFeed>),
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub progress_every_records: u64,
    pub progress_interval: Duration,
    pub read_buffer_size: usize,
    pub nested_flattening: bool,
}

impl From<&Config> for WriterConfig {
    fn from(config: &Config) -> Self {
        WriterConfig {
            progress_every_records: config.progress_every_records.max(1),
            progress_interval: config.progress_interval,
            read_buffer_size: config.read_buffer_size,
            nested_flattening: config.nested_flattening,
        }
    }
}

enum Outcome {
    Exhausted,
    Capped,
    Cancelled,
    Failed(Error),
}

/// The single writer of a session.
///
/// Owns the working schema; readers only ever see the copy published with
/// each progress point, together with the counters it was built from.
pub struct IngestWriter {
    session: Arc<Session>,
    schema: SchemaInferencer,
    observer: Arc<dyn IngestObserver>,
    config: WriterConfig,
    records_loaded: u64,
    errors_count: u64,
    since_publish: u64,
    last_publish: Instant,
    last_read: ReadProgress,
}

impl IngestWriter {
    pub fn new(session: Arc<Session>, config: &Config, observer: Arc<dyn IngestObserver>) -> Self {
        let config = WriterConfig::from(config);
        IngestWriter {
            session,
            schema: SchemaInferencer::new(config.nested_flattening),
            observer,
            config,
            records_loaded: 0,
            errors_count: 0,
            since_publish: 0,
            last_publish: Instant::now(),
            last_read: ReadProgress::default(),
        }
    }

    /// Runs the load on a dedicated thread.
    pub fn spawn(self, source: FeedSource) -> Result<IngestHandle> {
        let session = self.session.clone();
        let thread = thread::Builder::new()
            .name("linescope-ingest".to_string())
            .spawn(move || self.run(source))?;

        Ok(IngestHandle {
            session,
            thread: Some(thread),
        })
    }

    /// Runs the load on the calling thread and returns the terminal state.
    pub fn run(mut self, source: FeedSource) -> IngestionState {
        self.start();

        let outcome = match source {
            FeedSource::Path(path) => match LineSource::open(&path, self.config.read_buffer_size) {
                Ok(mut feed) => self.drain(&mut feed),
                Err(e) => Outcome::Failed(e),
            },
            FeedSource::Feed(mut feed) => self.drain(feed.as_mut()),
        };

        self.finish(outcome)
    }

    fn start(&mut self) {
        self.session.publish(|published| {
            published.state.status = IngestionStatus::Loading;
            published.state.started_at = Some(Utc::now());
        });
        self.last_publish = Instant::now();
        info!(session = %self.session.id(), source = self.session.label(), "ingestion started");
    }

    fn drain(&mut self, feed: &mut dyn LineFeed) -> Outcome {
        loop {
            if self.session.is_cancel_requested() {
                return Outcome::Cancelled;
            }
            if self.session.store().is_full() || self.session.error_log().is_full() {
                return Outcome::Capped;
            }

            let next = feed.next_line();

            // A line pulled after cancellation is dropped unseen
            if self.session.is_cancel_requested() {
                self.last_read = feed.progress();
                return Outcome::Cancelled;
            }

            match next {
                None => {
                    self.last_read = feed.progress();
                    return Outcome::Exhausted;
                }
                Some(Err(e)) => {
                    self.last_read = feed.progress();
                    return Outcome::Failed(e);
                }
                Some(Ok(line)) => {
                    if let Err(e) = self.consume(line) {
                        self.last_read = feed.progress();
                        return Outcome::Failed(e);
                    }
                }
            }

            self.since_publish += 1;
            if self.since_publish >= self.config.progress_every_records
                || self.last_publish.elapsed() >= self.config.progress_interval
            {
                self.last_read = feed.progress();
                self.publish_progress();
            }
        }
    }

    fn consume(&mut self, line: SourceLine) -> Result<()> {
        match decode_line(line.line_number, &line.text) {
            Decoded::Skip => {}
            Decoded::Record(record) => {
                let store = self.session.store();
                let index = store.append(record)?;
                if let Some(stored) = store.get(index) {
                    self.schema.observe(stored);
                }
                self.records_loaded += 1;
            }
            Decoded::Error(error) => {
                trace!(line = error.line_number, message = %error.message, "line rejected");
                self.session.error_log().push(error)?;
                self.errors_count += 1;
            }
        }
        Ok(())
    }

    fn publish_progress(&mut self) {
        let schema = self.schema.snapshot();
        let (records_loaded, errors_count) = (self.records_loaded, self.errors_count);

        let published = self.session.publish(|published| {
            published.state.records_loaded = records_loaded;
            published.state.errors_count = errors_count;
            published.schema = schema;
        });

        self.since_publish = 0;
        self.last_publish = Instant::now();

        let percent = self.last_read.percent();
        debug!(
            session = %self.session.id(),
            records = records_loaded,
            errors = errors_count,
            percent = percent.unwrap_or(0.0),
            "ingestion progress"
        );

        self.observer.on_progress(&Progress {
            session: self.session.id(),
            records_loaded,
            errors_count,
            status: published.state.status,
            percent,
        });
    }

    fn finish(mut self, outcome: Outcome) -> IngestionState {
        let (status, capped, failure) = match outcome {
            Outcome::Exhausted => (IngestionStatus::Completed, false, None),
            Outcome::Capped => (IngestionStatus::Completed, true, None),
            Outcome::Cancelled => (IngestionStatus::Cancelled, false, None),
            Outcome::Failed(e) => (IngestionStatus::Failed, false, Some(e.to_string())),
        };

        let schema = self.schema.snapshot();
        let (records_loaded, errors_count) = (self.records_loaded, self.errors_count);
        let published = self.session.publish(|published| {
            published.state.records_loaded = records_loaded;
            published.state.errors_count = errors_count;
            published.state.status = status;
            published.state.capped = capped;
            published.state.failure = failure.clone();
            published.state.finished_at = Some(Utc::now());
            published.schema = schema;
        });

        let id = self.session.id();
        match status {
            IngestionStatus::Failed => warn!(
                session = %id,
                records = records_loaded,
                errors = errors_count,
                failure = failure.as_deref().unwrap_or(""),
                "ingestion failed"
            ),
            IngestionStatus::Cancelled => {
                info!(session = %id, records = records_loaded, errors = errors_count, "ingestion cancelled")
            }
            _ => {
                if capped {
                    info!(session = %id, cap = ?published.state.line_cap, "line cap reached");
                }
                info!(session = %id, records = records_loaded, errors = errors_count, "ingestion completed")
            }
        }

        self.observer.on_progress(&Progress {
            session: id,
            records_loaded,
            errors_count,
            status,
            percent: self.last_read.percent(),
        });
        self.observer.on_complete(&Completion {
            session: id,
            records_loaded,
            errors_count,
            capped,
            status,
            failure,
        });

        published.state
    }
}

/// Owner's end of a running load. Dropping it cancels and drains the load.
pub struct IngestHandle {
    session: Arc<Session>,
    thread: Option<JoinHandle<IngestionState>>,
}

impl IngestHandle {
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn cancel(&self) {
        self.session.request_cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Waits for the terminal state. Calling it again returns the same state.
    pub fn join(&mut self) -> Result<IngestionState> {
        let Some(thread) = self.thread.take() else {
            return Ok(self.session.state());
        };

        thread.join().map_err(|_| {
            self.session.publish(|published| {
                published.state.status = IngestionStatus::Failed;
                published.state.failure = Some("ingestion thread panicked".to_string());
                published.state.finished_at = Some(Utc::now());
            });
            Error::new(ErrorKind::InvalidState, "ingestion thread panicked".to_string())
        })
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.cancel();
            let _ = self.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LineCap;
    use crate::reader::line_source::IterFeed;
    use crate::writer::observer::{ChannelObserver, IngestEvent, NoopObserver};

    fn feed(lines: &[&str]) -> Box<dyn LineFeed> {
        Box::new(IterFeed::from_lines(lines))
    }

    fn run(config: &Config, lines: &[&str]) -> (Arc<Session>, IngestionState) {
        let session = Arc::new(Session::new("mem".to_string(), config));
        let writer = IngestWriter::new(session.clone(), config, Arc::new(NoopObserver));
        let state = writer.run(FeedSource::Feed(feed(lines)));
        (session, state)
    }

    #[test]
    fn routes_records_errors_and_blanks() {
        let (session, state) = run(
            &Config::default(),
            &[r#"{"a":1}"#, "", "not json", r#"{"a":"x","b":true}"#, "   "],
        );

        assert_eq!(state.status, IngestionStatus::Completed);
        assert_eq!(state.records_loaded, 2);
        assert_eq!(state.errors_count, 1);
        assert!(!state.capped);
        assert_eq!(session.get(1).unwrap().line_number, 4);
        assert_eq!(session.errors()[0].line_number, 3);

        let schema = session.schema_snapshot();
        assert_eq!(schema.total_records, 2);
        assert_eq!(schema.field("a").unwrap().presence_count, 2);
    }

    #[test]
    fn stops_at_line_cap() {
        let config = Config::default().with_line_cap(LineCap::Limit(2));
        let (session, state) = run(&config, &["1", "bad", "2", "3", "4"]);

        assert_eq!(state.status, IngestionStatus::Completed);
        assert!(state.capped);
        assert_eq!(session.len(), 2);
        assert_eq!(state.errors_count, 1);
    }

    #[test]
    fn malformed_lines_are_capped_too() {
        let config = Config::default().with_line_cap(LineCap::Limit(2));
        let mut lines = vec![r#"{"ok":true}"#.to_string()];
        lines.extend((0..10_000).map(|i| format!("garbage {}", i)));
        let session = Arc::new(Session::new("mem".to_string(), &config));
        let writer = IngestWriter::new(session.clone(), &config, Arc::new(NoopObserver));
        let state = writer.run(FeedSource::Feed(Box::new(IterFeed::from_lines(&lines))));

        assert_eq!(state.status, IngestionStatus::Completed);
        assert!(state.capped);
        assert_eq!(state.records_loaded, 1);
        assert_eq!(state.errors_count, 2);
        assert_eq!(session.error_log().len(), 2);
        assert_eq!(session.errors()[1].line_number, 3);
    }

    #[test]
    fn unreadable_path_fails_the_session() {
        let config = Config::default();
        let session = Arc::new(Session::new("missing".to_string(), &config));
        let writer = IngestWriter::new(session.clone(), &config, Arc::new(NoopObserver));
        let state = writer.run(FeedSource::Path(PathBuf::from("/definitely/not/here.jsonl")));

        assert_eq!(state.status, IngestionStatus::Failed);
        assert!(state.failure.is_some());
        assert!(session.is_empty());
    }

    #[test]
    fn read_error_keeps_partial_data() {
        let config = Config::default();
        let session = Arc::new(Session::new("mem".to_string(), &config));
        let lines = vec![
            Ok(SourceLine { line_number: 1, text: "{}".to_string() }),
            Err(Error::new(ErrorKind::TruncatedStream, "cut".to_string())),
        ];
        let writer = IngestWriter::new(session.clone(), &config, Arc::new(NoopObserver));
        let state = writer.run(FeedSource::Feed(Box::new(IterFeed(lines.into_iter()))));

        assert_eq!(state.status, IngestionStatus::Failed);
        assert_eq!(state.records_loaded, 1);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn cancelled_before_start_loads_nothing() {
        let config = Config::default();
        let session = Arc::new(Session::new("mem".to_string(), &config));
        session.request_cancel();
        let writer = IngestWriter::new(session.clone(), &config, Arc::new(NoopObserver));
        let state = writer.run(FeedSource::Feed(feed(&["1", "2"])));

        assert_eq!(state.status, IngestionStatus::Cancelled);
        assert!(state.cancellation_requested);
        assert_eq!(session.len(), 0);
    }

    #[test]
    fn notifies_progress_then_completion_once() {
        let mut config = Config::default();
        config.progress_every_records = 2;
        let (observer, rx) = ChannelObserver::new();
        let session = Arc::new(Session::new("mem".to_string(), &config));
        let handle = IngestWriter::new(session.clone(), &config, Arc::new(observer))
            .spawn(FeedSource::Feed(feed(&["1", "2", "3", "4", "5"])));
        let mut handle = handle.unwrap();
        let state = handle.join().unwrap();
        assert_eq!(state.records_loaded, 5);

        let events: Vec<IngestEvent> = rx.try_iter().collect();
        let completions = events
            .iter()
            .filter(|e| matches!(e, IngestEvent::Completed(_)))
            .count();
        assert_eq!(completions, 1);
        assert!(matches!(events.last(), Some(IngestEvent::Completed(c)) if c.records_loaded == 5));

        let loaded: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                IngestEvent::Progress(p) => Some(p.records_loaded),
                _ => None,
            })
            .collect();
        assert!(loaded.len() >= 2);
        assert!(loaded.windows(2).all(|w| w[0] <= w[1]));
    }
}
