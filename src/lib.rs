pub mod core;
pub mod compression;
pub mod reader;
pub mod schema;
pub mod storage;
pub mod writer;
pub mod query;

pub use crate::core::config::{Config, LineCap};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::explorer::Explorer;
pub use crate::core::session::{IngestionSnapshot, Session};
pub use crate::core::types::{IngestionState, IngestionStatus, ParseError, Record, SessionId};
pub use crate::query::types::{MatchMode, QuerySpec};

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                            LINESCOPE STRUCT ARCHITECTURE                                   │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── CORE LAYER ─────────────────────────────────────────┐
│                                                                                            │
│  ┌──────────────────────────────────────────────────────────────────────────────────────┐  │
│  │                               struct Explorer                                        │  │
│  │  ┌────────────────────────────────────────────────────────────────────────────────┐  │  │
│  │  │ config: Config                       // Cap, flattening, progress cadence      │  │  │
│  │  │ observer: Arc<dyn IngestObserver>    // Progress + completion sink             │  │  │
│  │  │ current: Option<IngestHandle>        // At most one live session               │  │  │
│  │  │ engine: QueryEngine                  // Lazy scans + memoised parallel scans   │  │  │
│  │  └────────────────────────────────────────────────────────────────────────────────┘  │  │
│  └──────────────────────────────────────────────────────────────────────────────────────┘  │
│                                                                                            │
│  ┌──────────────────────────┐  ┌──────────────────────┐  ┌─────────────────────────────┐   │
│  │ struct Session           │  │ struct Record        │  │ struct IngestionState       │   │
│  │ • id: SessionId          │  │ • line_number: u64   │  │ • status: IngestionStatus   │   │
│  │ • store: Arc<RecordStore>│  │ • value: Value       │  │ • records_loaded / errors   │   │
│  │ • errors: ErrorLog       │  └──────────────────────┘  │ • line_cap / capped         │   │
│  │ • published: RwLock<     │                            │ • cancellation_requested    │   │
│  │   IngestionSnapshot>     │  ┌──────────────────────┐  │ • failure                   │   │
│  │ • cancel: AtomicBool     │  │ struct ParseError    │  └─────────────────────────────┘   │
│  └──────────────────────────┘  │ • line_number        │                                    │
│                                │ • raw_text / message │  ┌─────────────────────────────┐   │
│                                └──────────────────────┘  │ struct SessionStats         │   │
│                                                          └─────────────────────────────┘   │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────── INGESTION LAYER ────────────────────────────────────────┐
│                                                                                            │
│   file ──► LineSource ──► decode_line ──┬──► RecordStore (append, capped)                  │
│   (.gz → MultiGzDecoder)   Skip/Record/ │                                                  │
│                            Error        ├──► SchemaInferencer (working copy)               │
│                                         │                                                  │
│                                         └──► ErrorLog                                      │
│                                                                                            │
│   IngestWriter (own thread) publishes { IngestionState, Arc<SchemaSnapshot> } together     │
│   every N lines or T ms, then notifies IngestObserver::on_progress / on_complete.          │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────────── STORAGE LAYER ────────────────────────────────────────┐
│                                                                                            │
│  ┌────────────────────────────────────────┐  ┌─────────────────────────────────────────┐   │
│  │ struct AppendLog<T>                    │  │ struct RecordStore / ErrorLog           │   │
│  │ • segments: [OnceLock<[OnceLock<T>]>]  │  │ • log: AppendLog<_>                     │   │
│  │   (1024, 2048, 4096, ... entries)      │  │ • line_cap (records only)               │   │
│  │ • len: AtomicUsize (Release/Acquire)   │  └─────────────────────────────────────────┘   │
│  └────────────────────────────────────────┘                                                │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────────── QUERY LAYER ─────────────────────────────────────────┐
│                                                                                            │
│  QuerySpec { pattern, mode, field, case_sensitive }                                        │
│      │                                                                                     │
│      ▼                                                                                     │
│  RecordMatcher::compile ── Everything | Substring | Regex                                  │
│      │                                                                                     │
│      ├──► QueryMatches (lazy, ascending, bounded by len at start)                          │
│      └──► QueryEngine::query_all (rayon) ──► QueryCache (lru, keyed by scanned len)        │
└────────────────────────────────────────────────────────────────────────────────────────────┘
*/
