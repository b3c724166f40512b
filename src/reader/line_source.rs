use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use flate2::read::MultiGzDecoder;
use crate::compression::detect::CompressionType;
use crate::core::error::{Error, ErrorKind, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One physical line with its terminator removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line_number: u64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadProgress {
    pub bytes_read: u64,
    pub total_bytes: Option<u64>,
}

impl ReadProgress {
    pub fn percent(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(100.0),
            Some(total) => Some((self.bytes_read as f64 / total as f64 * 100.0).min(100.0)),
            None => None,
        }
    }
}

/// Anything the ingestion loop can pull lines from.
pub trait LineFeed: Send {
    fn next_line(&mut self) -> Option<Result<SourceLine>>;

    fn progress(&self) -> ReadProgress {
        ReadProgress::default()
    }
}

/// Adapts a plain iterator (fixtures, in-memory data) to `LineFeed`.
pub struct IterFeed<I>(pub I);

impl IterFeed<std::vec::IntoIter<Result<SourceLine>>> {
    /// Numbers `lines` from 1, as if each were read from a file.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let lines: Vec<Result<SourceLine>> = lines
            .iter()
            .zip(1u64..)
            .map(|(text, line_number)| {
                Ok(SourceLine {
                    line_number,
                    text: text.as_ref().to_string(),
                })
            })
            .collect();
        IterFeed(lines.into_iter())
    }
}

impl<I> LineFeed for IterFeed<I>
where
    I: Iterator<Item = Result<SourceLine>> + Send,
{
    fn next_line(&mut self) -> Option<Result<SourceLine>> {
        self.0.next()
    }
}

/// Counts bytes pulled from the underlying file, before decompression.
struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Lazy, finite, single-use sequence of lines over a plain or gzip file.
pub struct LineSource {
    reader: Box<dyn BufRead + Send>,
    compression: CompressionType,
    bytes_read: Arc<AtomicU64>,
    total_bytes: Option<u64>,
    line_number: u64,
    buffer: Vec<u8>,
    done: bool,
}

impl LineSource {
    pub fn open(path: &Path, buffer_size: usize) -> Result<Self> {
        let compression = CompressionType::detect(path)
            .map_err(|e| Error::new(ErrorKind::Io, format!("{}: {}", path.display(), e.context)))?;
        let file = File::open(path)
            .map_err(|e| Error::new(ErrorKind::Io, format!("{}: {}", path.display(), e)))?;
        let total_bytes = file.metadata().ok().map(|m| m.len());

        Ok(Self::from_reader(file, compression, total_bytes, buffer_size))
    }

    pub fn from_reader<R>(
        reader: R,
        compression: CompressionType,
        total_bytes: Option<u64>,
        buffer_size: usize,
    ) -> Self
    where
        R: Read + Send + 'static,
    {
        let bytes_read = Arc::new(AtomicU64::new(0));
        let counted = CountingReader { inner: reader, count: bytes_read.clone() };

        let reader: Box<dyn BufRead + Send> = match compression {
            CompressionType::None => Box::new(BufReader::with_capacity(buffer_size, counted)),
            CompressionType::Gzip => {
                Box::new(BufReader::with_capacity(buffer_size, MultiGzDecoder::new(counted)))
            }
        };

        LineSource {
            reader,
            compression,
            bytes_read,
            total_bytes,
            line_number: 0,
            buffer: Vec::with_capacity(4096),
            done: false,
        }
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    /// Gzip corruption after the first decoded byte is a truncation, before it
    /// the file simply is not readable.
    fn classify_read_error(&self, err: std::io::Error) -> Error {
        let started = self.line_number > 0 || !self.buffer.is_empty();
        match self.compression {
            CompressionType::Gzip if started => Error::new(
                ErrorKind::TruncatedStream,
                format!("compressed stream ended after line {}: {}", self.line_number, err),
            ),
            _ => Error::new(ErrorKind::Io, err.to_string()),
        }
    }

    fn strip_terminator(buffer: &mut Vec<u8>) {
        if buffer.last() == Some(&b'\n') {
            buffer.pop();
            if buffer.last() == Some(&b'\r') {
                buffer.pop();
            }
        }
    }
}

impl Iterator for LineSource {
    type Item = Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                Self::strip_terminator(&mut self.buffer);

                let mut bytes = &self.buffer[..];
                if self.line_number == 1 {
                    bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                }

                Some(Ok(SourceLine {
                    line_number: self.line_number,
                    text: String::from_utf8_lossy(bytes).into_owned(),
                }))
            }
            Err(err) => {
                // The partial tail of a broken stream is never yielded
                self.done = true;
                Some(Err(self.classify_read_error(err)))
            }
        }
    }
}

impl LineFeed for LineSource {
    fn next_line(&mut self) -> Option<Result<SourceLine>> {
        self.next()
    }

    fn progress(&self) -> ReadProgress {
        ReadProgress {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            total_bytes: self.total_bytes,
        }
    }
}
