use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    TruncatedStream,
    JsonDecode,
    InvalidPattern,
    CapacityReached,
    InvalidState,
    NotFound,
}

#[derive(Debug, ThisError)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    /// Session-level failures end ingestion; everything else is local to one call.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self.kind, ErrorKind::Io | ErrorKind::TruncatedStream)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::JsonDecode,
            context: err.to_string(),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error {
            kind: ErrorKind::InvalidPattern,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_and_context() {
        let err = Error::new(ErrorKind::NotFound, "record 7".to_string());
        assert_eq!(err.to_string(), "NotFound: record 7");
    }

    #[test]
    fn regex_errors_become_invalid_pattern() {
        let err: Error = regex::Regex::new("(unclosed").unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::InvalidPattern);
        assert!(!err.is_fatal_to_session());
    }
}
