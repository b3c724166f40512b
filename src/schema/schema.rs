use std::collections::HashMap;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use crate::core::types::Record;

/// JSON shape of a value. Integers and floats share one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeTag {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl TypeTag {
    pub const ALL: [TypeTag; 6] = [
        TypeTag::Null,
        TypeTag::Bool,
        TypeTag::Number,
        TypeTag::String,
        TypeTag::Array,
        TypeTag::Object,
    ];

    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Bool => "bool",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Occurrence count per type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeCounts {
    counts: [u64; 6],
}

impl TypeCounts {
    pub fn get(&self, tag: TypeTag) -> u64 {
        self.counts[tag.slot()]
    }

    pub fn increment(&mut self, tag: TypeTag) {
        self.counts[tag.slot()] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Tags actually observed, in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeTag, u64)> + '_ {
        TypeTag::ALL
            .iter()
            .map(|tag| (*tag, self.get(*tag)))
            .filter(|(_, count)| *count > 0)
    }

    /// Highest counts first; ties keep tag order.
    pub fn most_common(&self, n: usize) -> Vec<(TypeTag, u64)> {
        let mut seen: Vec<(TypeTag, u64)> = self.iter().collect();
        seen.sort_by(|a, b| b.1.cmp(&a.1));
        seen.truncate(n);
        seen
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field_path: String,
    pub type_counts: TypeCounts,
    pub presence_count: u64,
}

impl FieldSummary {
    fn new(field_path: String) -> Self {
        FieldSummary {
            field_path,
            type_counts: TypeCounts::default(),
            presence_count: 0,
        }
    }

    pub fn coverage(&self, total_records: u64) -> f64 {
        if total_records == 0 {
            0.0
        } else {
            self.presence_count as f64 / total_records as f64
        }
    }

    /// Most common first, e.g. "string(3), number(1)".
    pub fn type_label(&self) -> String {
        self.type_counts
            .most_common(TypeTag::ALL.len())
            .iter()
            .map(|(tag, count)| format!("{}({})", tag.name(), count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Running schema summary. Fields keep first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaSnapshot {
    pub total_records: u64,
    pub fields: Vec<FieldSummary>,
    pub nested_flattening: bool,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl PartialEq for SchemaSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.total_records == other.total_records
            && self.nested_flattening == other.nested_flattening
            && self.fields == other.fields
    }
}

impl SchemaSnapshot {
    pub fn new(nested_flattening: bool) -> Self {
        SchemaSnapshot {
            nested_flattening,
            ..Default::default()
        }
    }

    /// Fold one record in; cost is linear in the fields it carries.
    pub fn observe(&mut self, value: &Value) {
        self.total_records += 1;
        if let Value::Object(map) = value {
            self.observe_object(None, map);
        }
    }

    fn observe_object(&mut self, prefix: Option<&str>, map: &Map<String, Value>) {
        for (key, value) in map {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, key),
                None => key.clone(),
            };

            self.observe_field(&path, value);

            if self.nested_flattening {
                if let Value::Object(inner) = value {
                    self.observe_object(Some(&path), inner);
                }
            }
        }
    }

    fn observe_field(&mut self, path: &str, value: &Value) {
        let position = match self.positions.get(path) {
            Some(position) => *position,
            None => {
                let position = self.fields.len();
                self.fields.push(FieldSummary::new(path.to_string()));
                self.positions.insert(path.to_string(), position);
                position
            }
        };

        let summary = &mut self.fields[position];
        summary.presence_count += 1;
        summary.type_counts.increment(TypeTag::of(value));
    }

    pub fn field(&self, path: &str) -> Option<&FieldSummary> {
        self.positions.get(path).map(|position| &self.fields[*position])
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field_path.as_str())
    }
}

/// Pure form of `observe`.
pub fn fold(mut snapshot: SchemaSnapshot, record: &Record) -> SchemaSnapshot {
    snapshot.observe(&record.value);
    snapshot
}

/// Single-writer schema state with cheap shared snapshots.
///
/// The ingestion thread owns the working copy; readers only ever see an
/// `Arc` taken at a publication point, so no summary is observed mid-update.
pub struct SchemaInferencer {
    working: SchemaSnapshot,
    published: Arc<SchemaSnapshot>,
    dirty: bool,
}

impl SchemaInferencer {
    pub fn new(nested_flattening: bool) -> Self {
        SchemaInferencer {
            working: SchemaSnapshot::new(nested_flattening),
            published: Arc::new(SchemaSnapshot::new(nested_flattening)),
            dirty: false,
        }
    }

    pub fn observe(&mut self, record: &Record) {
        self.working.observe(&record.value);
        self.dirty = true;
    }

    pub fn total_records(&self) -> u64 {
        self.working.total_records
    }

    /// Point-in-time copy; reused until the next `observe`.
    pub fn snapshot(&mut self) -> Arc<SchemaSnapshot> {
        if self.dirty {
            self.published = Arc::new(self.working.clone());
            self.dirty = false;
        }
        self.published.clone()
    }
}
