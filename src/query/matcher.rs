use std::borrow::Cow;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Record;
use crate::query::types::{MatchMode, QuerySpec};

enum Pattern {
    Everything,
    Substring { needle: String, case_sensitive: bool },
    Regex(Regex),
}

/// A compiled `QuerySpec`. Compile once, then test any number of records.
pub struct RecordMatcher {
    pattern: Pattern,
    field: Option<String>,
}

impl RecordMatcher {
    pub fn compile(spec: &QuerySpec) -> Result<Self> {
        let pattern = if spec.matches_everything() {
            Pattern::Everything
        } else {
            match spec.mode {
                MatchMode::Substring => Pattern::Substring {
                    needle: if spec.case_sensitive {
                        spec.pattern.clone()
                    } else {
                        spec.pattern.to_lowercase()
                    },
                    case_sensitive: spec.case_sensitive,
                },
                MatchMode::Regex => {
                    let regex = RegexBuilder::new(&spec.pattern)
                        .case_insensitive(!spec.case_sensitive)
                        .build()
                        .map_err(|e| {
                            Error::new(ErrorKind::InvalidPattern, format!("{}: {}", spec.pattern, e))
                        })?;
                    Pattern::Regex(regex)
                }
            }
        };

        Ok(RecordMatcher {
            pattern,
            field: spec.field.clone(),
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        match &self.field {
            None => self.matches_text(&record.to_json()),
            Some(field) => match resolve_field(&record.value, field) {
                Some(value) => self.matches_text(&field_text(value)),
                None => false,
            },
        }
    }

    fn matches_text(&self, haystack: &str) -> bool {
        match &self.pattern {
            Pattern::Everything => true,
            Pattern::Substring { needle, case_sensitive: true } => haystack.contains(needle.as_str()),
            Pattern::Substring { needle, case_sensitive: false } => {
                haystack.to_lowercase().contains(needle.as_str())
            }
            Pattern::Regex(regex) => regex.is_match(haystack),
        }
    }
}

/// Looks up `path` in an object record: the literal key first, then the
/// dotted path through nested objects.
pub fn resolve_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let object = value.as_object()?;
    if let Some(found) = object.get(path) {
        return Some(found);
    }
    if !path.contains('.') {
        return None;
    }

    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Strings are searched by their contents, anything else by its compact JSON.
pub fn field_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::new(1, value)
    }

    #[test]
    fn substring_respects_case_flag() {
        let r = record(json!({"msg": "Hello World"}));
        assert!(RecordMatcher::compile(&QuerySpec::substring("hello")).unwrap().matches(&r));
        let strict = QuerySpec::substring("hello").case_sensitive(true);
        assert!(!RecordMatcher::compile(&strict).unwrap().matches(&r));
    }

    #[test]
    fn field_scope_uses_raw_string_contents() {
        let r = record(json!({"msg": "say \"hi\"", "n": 42}));
        let quoted = QuerySpec::substring("say \"hi").in_field("msg");
        assert!(RecordMatcher::compile(&quoted).unwrap().matches(&r));

        let number = QuerySpec::substring("42").in_field("n");
        assert!(RecordMatcher::compile(&number).unwrap().matches(&r));

        let missing = QuerySpec::substring("42").in_field("absent");
        assert!(!RecordMatcher::compile(&missing).unwrap().matches(&r));
    }

    #[test]
    fn whole_record_matches_keys_and_values() {
        let r = record(json!({"level": "error"}));
        assert!(RecordMatcher::compile(&QuerySpec::substring("level")).unwrap().matches(&r));
        assert!(RecordMatcher::compile(&QuerySpec::substring("\"error\"")).unwrap().matches(&r));
    }

    #[test]
    fn regex_and_invalid_pattern() {
        let r = record(json!({"id": "A-17"}));
        let spec = QuerySpec::regex(r"a-\d+").in_field("id");
        assert!(RecordMatcher::compile(&spec).unwrap().matches(&r));

        let err = RecordMatcher::compile(&QuerySpec::regex("(unclosed")).err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidPattern);
    }

    #[test]
    fn empty_pattern_with_field_tests_presence() {
        let spec = QuerySpec::substring("").in_field("a");
        let matcher = RecordMatcher::compile(&spec).unwrap();
        assert!(matcher.matches(&record(json!({"a": null}))));
        assert!(!matcher.matches(&record(json!({"b": 1}))));
        assert!(!matcher.matches(&record(json!([1, 2]))));
    }

    #[test]
    fn dotted_paths_reach_nested_values() {
        let r = record(json!({"user": {"name": "ada"}, "a.b": 1}));
        assert_eq!(resolve_field(&r.value, "user.name"), Some(&json!("ada")));
        assert_eq!(resolve_field(&r.value, "a.b"), Some(&json!(1)));
        assert_eq!(resolve_field(&r.value, "user.age"), None);
    }
}
