use serde::{Serialize, Deserialize};
use serde_json::Value;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::core::config::LineCap;

/// One successfully decoded line. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub line_number: u64,   // 1-based, matches the source file
    pub value: Value,
}

impl Record {
    pub fn new(line_number: u64, value: Value) -> Self {
        Record { line_number, value }
    }

    /// Compact JSON text, used by whole-record searches and export.
    pub fn to_json(&self) -> String {
        self.value.to_string()
    }

    /// Compact JSON cut to `max_chars` characters, with a trailing `...` when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let text = self.to_json();
        match text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text,
        }
    }
}

/// A line that failed to parse. Data, not a pipeline failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub line_number: u64,
    pub raw_text: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionStatus {
    Idle,
    Loading,
    Completed,
    Cancelled,
    Failed,
}

impl IngestionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestionStatus::Completed | IngestionStatus::Cancelled | IngestionStatus::Failed
        )
    }
}

/// Lifecycle of one open-file session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionState {
    pub session: Option<SessionId>,
    pub status: IngestionStatus,
    pub records_loaded: u64,
    pub errors_count: u64,
    pub line_cap: LineCap,
    pub capped: bool,
    pub cancellation_requested: bool,
    pub failure: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionState {
    pub fn idle(line_cap: LineCap) -> Self {
        IngestionState {
            session: None,
            status: IngestionStatus::Idle,
            records_loaded: 0,
            errors_count: 0,
            line_cap,
            capped: false,
            cancellation_requested: false,
            failure: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Lines consumed from the source so far (blank lines excluded).
    pub fn lines_consumed(&self) -> u64 {
        self.records_loaded + self.errors_count
    }
}
