use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::core::error::{Error, ErrorKind, Result};

/// Entries in segment 0; segment `n` holds `BASE_SEGMENT_LEN << n`.
const BASE_SEGMENT_LEN: usize = 1024;
const MAX_SEGMENTS: usize = 48;

type Segment<T> = Box<[OnceLock<T>]>;

/// Append-only, randomly indexable log with lock-free reads.
///
/// Segments double in size and are never moved or freed while the log lives,
/// so a published entry stays at the same address. `len` is the only thing
/// readers synchronize on: it is stored with `Release` after the entry is
/// written, so every index below an observed `len` is fully populated.
pub struct AppendLog<T> {
    segments: Box<[OnceLock<Segment<T>>]>,
    len: AtomicUsize,
    capacity: Option<usize>,
}

impl<T> AppendLog<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        AppendLog {
            segments: (0..MAX_SEGMENTS).map(|_| OnceLock::new()).collect(),
            len: AtomicUsize::new(0),
            capacity,
        }
    }

    fn locate(index: usize) -> (usize, usize) {
        let segment = (index / BASE_SEGMENT_LEN + 1).ilog2() as usize;
        let start = BASE_SEGMENT_LEN * ((1usize << segment) - 1);
        (segment, index - start)
    }

    fn segment_len(&self, segment: usize) -> usize {
        let full = BASE_SEGMENT_LEN << segment;
        match self.capacity {
            Some(cap) => {
                let start = BASE_SEGMENT_LEN * ((1usize << segment) - 1);
                full.min(cap.saturating_sub(start))
            }
            None => full,
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        matches!(self.capacity, Some(cap) if self.len() >= cap)
    }

    /// Single-writer append; returns the new entry's index.
    pub fn append(&self, item: T) -> Result<usize> {
        let index = self.len.load(Ordering::Acquire);
        if let Some(cap) = self.capacity {
            if index >= cap {
                return Err(Error::new(
                    ErrorKind::CapacityReached,
                    format!("append log is full at {} entries", cap),
                ));
            }
        }

        let (segment, offset) = Self::locate(index);
        if segment >= MAX_SEGMENTS {
            return Err(Error::new(ErrorKind::CapacityReached, format!("index {} out of range", index)));
        }

        let slots = self.segments[segment].get_or_init(|| {
            (0..self.segment_len(segment)).map(|_| OnceLock::new()).collect()
        });

        slots[offset]
            .set(item)
            .map_err(|_| Error::new(ErrorKind::InvalidState, format!("slot {} written twice", index)))?;

        self.len.store(index + 1, Ordering::Release);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len() {
            return None;
        }
        let (segment, offset) = Self::locate(index);
        self.segments[segment].get()?.get(offset)?.get()
    }

    /// Entries in `[from, to)`, clamped to the length observed now.
    pub fn range(&self, from: usize, to: usize) -> Range<'_, T> {
        let end = to.min(self.len());
        Range {
            log: self,
            next: from.min(end),
            end,
        }
    }
}

pub struct Range<'a, T> {
    log: &'a AppendLog<T>,
    next: usize,
    end: usize,
}

impl<'a, T> Iterator for Range<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let item = self.log.get(self.next);
        self.next += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn locate_walks_doubling_segments() {
        assert_eq!(AppendLog::<u8>::locate(0), (0, 0));
        assert_eq!(AppendLog::<u8>::locate(1023), (0, 1023));
        assert_eq!(AppendLog::<u8>::locate(1024), (1, 0));
        assert_eq!(AppendLog::<u8>::locate(3071), (1, 2047));
        assert_eq!(AppendLog::<u8>::locate(3072), (2, 0));
    }

    #[test]
    fn append_past_segment_boundaries() {
        let log = AppendLog::new(None);
        for i in 0..5000u32 {
            assert_eq!(log.append(i).unwrap(), i as usize);
        }
        assert_eq!(log.len(), 5000);
        assert_eq!(log.get(4096), Some(&4096));
        assert_eq!(log.get(5000), None);
        assert_eq!(log.range(4998, 9999).copied().collect::<Vec<_>>(), vec![4998, 4999]);
    }

    #[test]
    fn capacity_rejects_extra_appends() {
        let log = AppendLog::new(Some(3));
        for i in 0..3 {
            log.append(i).unwrap();
        }
        assert!(log.is_full());
        let err = log.append(3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CapacityReached);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn readers_see_stable_prefix_while_appending() {
        let log = Arc::new(AppendLog::new(None));
        let writer = {
            let log = log.clone();
            std::thread::spawn(move || {
                for i in 0..20_000u64 {
                    log.append(i).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let len = log.len();
            let seen: Vec<u64> = log.range(0, len).copied().collect();
            assert_eq!(seen.len(), len);
            assert!(seen.iter().enumerate().all(|(i, v)| *v == i as u64));
        }

        writer.join().unwrap();
        assert_eq!(log.len(), 20_000);
    }
}
