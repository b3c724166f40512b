use crate::core::config::LineCap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Record;
use crate::storage::segment::{AppendLog, Range};

/// Every decoded record of one session, in file order, up to the line cap.
///
/// Indices are assigned in append order and never reassigned. A reader that
/// sees `len() == n` may read all of `[0, n)` while appends continue.
pub struct RecordStore {
    log: AppendLog<Record>,
    line_cap: LineCap,
}

impl RecordStore {
    pub fn with_cap(line_cap: LineCap) -> Self {
        let capacity = line_cap
            .limit()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        RecordStore {
            log: AppendLog::new(capacity),
            line_cap,
        }
    }

    pub fn unbounded() -> Self {
        Self::with_cap(LineCap::Unbounded)
    }

    /// Appends in strictly increasing line order; the full store answers
    /// `CapacityReached`, which tells the pipeline to stop pulling.
    pub fn append(&self, record: Record) -> Result<usize> {
        if let Some(last) = self.last() {
            if record.line_number <= last.line_number {
                return Err(Error::new(
                    ErrorKind::InvalidState,
                    format!(
                        "line {} appended after line {}",
                        record.line_number, last.line_number
                    ),
                ));
            }
        }
        self.log.append(record)
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
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

    pub fn line_cap(&self) -> LineCap {
        self.line_cap
    }

    pub fn last(&self) -> Option<&Record> {
        match self.len() {
            0 => None,
            n => self.get(n - 1),
        }
    }

    /// Records in `[from, to)` as of now; call again with the same range to restart.
    pub fn iterate(&self, from: usize, to: usize) -> Range<'_, Record> {
        self.log.range(from, to)
    }

    /// Binary search by source line number.
    pub fn position_of_line(&self, line_number: u64) -> Option<usize> {
        let (mut low, mut high) = (0usize, self.len());
        while low < high {
            let mid = low + (high - low) / 2;
            let line = self.get(mid)?.line_number;
            if line == line_number {
                return Some(mid);
            } else if line < line_number {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        None
    }
}
