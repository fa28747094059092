//! JSON output formatter for run results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "target": {
//!     "region": "eu-central-1",
//!     "table": "users",
//!     "index_attribute": "email"
//!   },
//!   "summary": {
//!     "duplicated_items": 2,
//!     "total": 5,
//!     "distinct_values": 3,
//!     "rows_scanned": 6,
//!     "rows_without_value": 0,
//!     "empty_groups": 0,
//!     "singleton_groups": 1,
//!     "duration_ms": 1234,
//!     "finished_at": "2024-01-01T00:00:00Z",
//!     "exit_code": 0,
//!     "exit_code_name": "DD000"
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::duplicates::ScanSummary;
use crate::error::ExitCode;

/// The table and attribute a run was pointed at.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonTarget {
    /// Region identifier as given on the command line
    pub region: String,
    /// Table name, or the fixture path for `--fixture` runs
    pub table: String,
    /// Secondary-index attribute name
    pub index_attribute: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Distinct index values shared by 2+ rows
    pub duplicated_items: u64,
    /// Rows in duplicate groups, summed over groups
    pub total: u64,
    /// Distinct index values found by the scan
    pub distinct_values: u64,
    /// Rows visited by the scan
    pub rows_scanned: u64,
    /// Rows without the index attribute
    pub rows_without_value: u64,
    /// Values whose query returned no rows
    pub empty_groups: u64,
    /// Values held by exactly one row
    pub singleton_groups: u64,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
    /// When the run finished (RFC 3339, UTC)
    pub finished_at: String,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(
        summary: &ScanSummary,
        exit_code: ExitCode,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            duplicated_items: summary.statistic.duplicated_items(),
            total: summary.statistic.total(),
            distinct_values: summary.distinct_values,
            rows_scanned: summary.rows_scanned,
            rows_without_value: summary.rows_without_value,
            empty_groups: summary.empty_groups,
            singleton_groups: summary.singleton_groups,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// What was scanned
    pub target: JsonTarget,
    /// Run summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output, stamped with the current time.
    #[must_use]
    pub fn new(target: JsonTarget, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self::at(target, summary, exit_code, Utc::now())
    }

    /// Create a new JSON output with an explicit finish time.
    #[must_use]
    pub fn at(
        target: JsonTarget,
        summary: &ScanSummary,
        exit_code: ExitCode,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            summary: JsonSummary::from_scan_summary(summary, exit_code, finished_at),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::Statistic;
    use chrono::TimeZone;
    use std::time::Duration;

    fn create_test_summary() -> ScanSummary {
        let mut statistic = Statistic::new();
        statistic.increment_duplicated_items();
        statistic.increment_total();
        statistic.increment_total();
        ScanSummary {
            statistic,
            distinct_values: 2,
            rows_scanned: 3,
            rows_without_value: 0,
            empty_groups: 0,
            singleton_groups: 1,
            duration: Duration::from_millis(1234),
        }
    }

    fn target() -> JsonTarget {
        JsonTarget {
            region: "eu-central-1".into(),
            table: "users".into(),
            index_attribute: "email".into(),
        }
    }

    #[test]
    fn test_json_summary_fields() {
        let finished = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let output = JsonOutput::at(target(), &create_test_summary(), ExitCode::Success, finished);

        assert_eq!(output.summary.duplicated_items, 1);
        assert_eq!(output.summary.total, 2);
        assert_eq!(output.summary.distinct_values, 2);
        assert_eq!(output.summary.duration_ms, 1234);
        assert_eq!(output.summary.finished_at, "2024-01-02T03:04:05Z");
        assert_eq!(output.summary.exit_code, 0);
        assert_eq!(output.summary.exit_code_name, "DD000");
    }

    #[test]
    fn test_to_json_parses_back() {
        let output = JsonOutput::new(target(), &create_test_summary(), ExitCode::Success);
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert_eq!(value["target"]["table"], "users");
        assert_eq!(value["target"]["index_attribute"], "email");
        assert_eq!(value["summary"]["duplicated_items"], 1);
        assert_eq!(value["summary"]["total"], 2);
    }

    #[test]
    fn test_to_json_pretty_has_newlines() {
        let output = JsonOutput::new(target(), &ScanSummary::default(), ExitCode::Success);
        assert!(output.to_json_pretty().unwrap().contains('\n'));
    }

    #[test]
    fn test_write_to_appends_newline() {
        let output = JsonOutput::new(target(), &ScanSummary::default(), ExitCode::Success);
        let mut buf = Vec::new();
        output.write_to(&mut buf, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(text.lines().count(), 1);
    }
}
