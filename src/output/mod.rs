//! Output formatters for run results.
//!
//! This module provides the ways results leave the process:
//! - a plain summary line on stdout (default)
//! - JSON for automation and scripting
//! - a streaming CSV export of every duplicate record
//!
//! # Example
//!
//! ```
//! use dynadupe::accessor::MemoryTable;
//! use dynadupe::duplicates::DuplicateFinder;
//! use dynadupe::output::summary_line;
//!
//! let table = MemoryTable::from_values("email", &["x", "y", "x"]);
//! let stats = DuplicateFinder::with_defaults(&table).find_duplicates("email").unwrap();
//!
//! assert_eq!(summary_line(&stats), "Summary: Duplicated items - 1, Total - 2");
//! ```

pub mod csv;
pub mod json;

// Re-export main types
pub use csv::CsvExport;
pub use json::{JsonOutput, JsonTarget};

use crate::duplicates::Statistic;

/// The one-line summary printed at the end of a text-mode run.
#[must_use]
pub fn summary_line(statistic: &Statistic) -> String {
    format!("Summary: {statistic}")
}
