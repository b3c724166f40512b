use serde_json::Value;
use crate::core::types::{ParseError, Record};

/// Outcome of decoding one raw line.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Skip,                   // Blank line: neither a record nor an error
    Record(Record),
    Error(ParseError),
}

/// Parse one line as a single JSON value of any shape.
///
/// Never fails: a malformed line comes back as `Decoded::Error` carrying the
/// parser's one-line diagnostic (with line/column of the fault).
pub fn decode_line(line_number: u64, raw: &str) -> Decoded {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decoded::Skip;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Decoded::Record(Record::new(line_number, value)),
        Err(err) => Decoded::Error(ParseError {
            line_number,
            raw_text: raw.to_string(),
            message: diagnostic(&err),
        }),
    }
}

fn diagnostic(err: &serde_json::Error) -> String {
    let category = match err.classify() {
        serde_json::error::Category::Syntax => "syntax error",
        serde_json::error::Category::Eof => "unexpected end of input",
        serde_json::error::Category::Data => "invalid data",
        serde_json::error::Category::Io => "read error",
    };
    // serde_json's Display already names line and column
    format!("{}: {}", category, err).replace('\n', " ")
}
