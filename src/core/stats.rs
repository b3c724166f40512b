use std::fmt;
use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::core::session::IngestionSnapshot;
use crate::core::types::{IngestionStatus, SessionId};

/// Load summary for one session, computed from a published snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session: Option<SessionId>,
    pub status: IngestionStatus,

    pub total_lines: u64,           // Non-blank lines consumed
    pub valid_records: u64,
    pub parse_errors: u64,
    pub success_rate: f64,          // Percent of consumed lines that decoded
    pub capped: bool,

    pub unique_fields: usize,
    pub field_coverage: Vec<FieldCoverage>,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldCoverage {
    pub field_path: String,
    pub presence_count: u64,
    pub coverage_percent: f64,
    pub types: String,
}

impl SessionStats {
    pub fn from_snapshot(snapshot: &IngestionSnapshot) -> Self {
        let state = &snapshot.state;
        let schema = &snapshot.schema;
        let total_lines = state.lines_consumed();
        let success_rate = if total_lines == 0 {
            0.0
        } else {
            state.records_loaded as f64 / total_lines as f64 * 100.0
        };

        let field_coverage = schema
            .fields
            .iter()
            .map(|field| FieldCoverage {
                field_path: field.field_path.clone(),
                presence_count: field.presence_count,
                coverage_percent: field.coverage(schema.total_records) * 100.0,
                types: field.type_label(),
            })
            .collect();

        SessionStats {
            session: state.session,
            status: state.status,
            total_lines,
            valid_records: state.records_loaded,
            parse_errors: state.errors_count,
            success_rate,
            capped: state.capped,
            unique_fields: schema.fields.len(),
            field_coverage,
            started_at: state.started_at,
            finished_at: state.finished_at,
        }
    }

    pub fn load_duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status:        {:?}{}", self.status, if self.capped { " (capped)" } else { "" })?;
        writeln!(f, "lines:         {}", self.total_lines)?;
        writeln!(f, "records:       {}", self.valid_records)?;
        writeln!(f, "parse errors:  {}", self.parse_errors)?;
        writeln!(f, "success rate:  {:.1}%", self.success_rate)?;
        if let Some(duration) = self.load_duration() {
            writeln!(f, "load time:     {} ms", duration.num_milliseconds())?;
        }
        writeln!(f, "fields:        {}", self.unique_fields)?;
        for field in &self.field_coverage {
            writeln!(
                f,
                "  {:<24} {:>6.1}%  {}",
                field.field_path, field.coverage_percent, field.types
            )?;
        }
        Ok(())
    }
}
