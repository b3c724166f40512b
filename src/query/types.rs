use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MatchMode {
    #[default]
    Substring,
    Regex,
}

/// What to look for and where.
///
/// An empty pattern matches every record, or, with a field set, every record
/// where that field is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySpec {
    pub pattern: String,
    pub mode: MatchMode,
    pub field: Option<String>,   // None searches the whole record
    pub case_sensitive: bool,
}

impl QuerySpec {
    pub fn substring(pattern: impl Into<String>) -> Self {
        QuerySpec {
            pattern: pattern.into(),
            mode: MatchMode::Substring,
            field: None,
            case_sensitive: false,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        QuerySpec {
            mode: MatchMode::Regex,
            ..Self::substring(pattern)
        }
    }

    pub fn in_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    pub fn matches_everything(&self) -> bool {
        self.pattern.is_empty()
    }
}
