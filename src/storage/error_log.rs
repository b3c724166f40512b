use crate::core::config::LineCap;
use crate::core::error::Result;
use crate::core::types::ParseError;
use crate::storage::segment::{AppendLog, Range};

/// Lines that failed to decode, in file order. Capped like the record store,
/// with its own count, so a file of garbage cannot grow it past the line cap.
pub struct ErrorLog {
    log: AppendLog<ParseError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::with_cap(LineCap::Unbounded)
    }

    pub fn with_cap(line_cap: LineCap) -> Self {
        let capacity = line_cap
            .limit()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        ErrorLog {
            log: AppendLog::new(capacity),
        }
    }

    pub fn push(&self, error: ParseError) -> Result<usize> {
        self.log.append(error)
    }

    pub fn get(&self, index: usize) -> Option<&ParseError> {
        self.log.get(index)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.log.is_full()
    }

    pub fn iterate(&self, from: usize, to: usize) -> Range<'_, ParseError> {
        self.log.range(from, to)
    }

    pub fn to_vec(&self) -> Vec<ParseError> {
        self.iterate(0, usize::MAX).cloned().collect()
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}
