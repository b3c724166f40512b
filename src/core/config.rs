use std::time::Duration;
use serde::{Serialize, Deserialize};

/// Upper bound on the number of records a session keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    Unbounded,
    Limit(u64),
}

impl LineCap {
    /// Zero means "no limit", matching the viewer's "All" setting.
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            LineCap::Unbounded
        } else {
            LineCap::Limit(count)
        }
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            LineCap::Unbounded => None,
            LineCap::Limit(n) => Some(*n),
        }
    }
}

impl Default for LineCap {
    fn default() -> Self {
        LineCap::Limit(10_000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub line_cap: LineCap,
    pub nested_flattening: bool,                // Dotted paths for nested object fields
    pub case_sensitive: bool,                   // Default for Explorer::search

    pub progress_every_records: u64,            // Notify after this many lines...
    pub progress_interval: Duration,            // ...or after this much time, whichever first

    pub read_buffer_size: usize,
    pub query_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            line_cap: LineCap::default(),
            nested_flattening: false,
            case_sensitive: false,

            progress_every_records: 1000,
            progress_interval: Duration::from_millis(100),

            read_buffer_size: 64 * 1024,               // 64KB reader buffer
            query_cache_size: 64,                      // 64 memoised result sets
        }
    }
}

impl Config {
    pub fn with_line_cap(mut self, line_cap: LineCap) -> Self {
        self.line_cap = line_cap;
        self
    }

    pub fn with_nested_flattening(mut self, enabled: bool) -> Self {
        self.nested_flattening = enabled;
        self
    }

    pub fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }
}
