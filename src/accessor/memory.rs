//! In-memory table accessor.
//!
//! [`MemoryTable`] implements [`TableAccessor`] over a `Vec<Record>`. It
//! backs the integration tests and the `--fixture` option, which runs the
//! detection against a JSON file instead of a live table.
//!
//! Two fault hooks exercise the finder's error paths:
//!
//! * [`MemoryTable::with_phantom_value`] makes the scan report a value that
//!   no query can find (a row deleted between scan and query)
//! * [`MemoryTable::with_read_failure`] makes a scan or a query fail
//!   partway through its stream

use std::cell::Cell;
use std::fs;
use std::path::Path;

use super::{AccessorError, AttrValue, Record, RecordCursor, TableAccessor};

/// Where an injected read failure strikes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// The scan fails after yielding this many rows.
    Scan { after: usize },
    /// The query for `value` fails after yielding this many rows.
    Query { value: String, after: usize },
}

/// A table held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryTable {
    rows: Vec<Record>,
    phantom_values: Vec<String>,
    failure: Option<ReadFailure>,
    scans: Cell<usize>,
    queries: Cell<usize>,
}

impl MemoryTable {
    /// Create a table from the given rows.
    #[must_use]
    pub fn from_records(rows: Vec<Record>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Create a table whose rows carry only `attribute`, one row per value.
    ///
    /// Every row also gets a unique `id` so emitted records are
    /// distinguishable.
    #[must_use]
    pub fn from_values<S: AsRef<str>>(attribute: &str, values: &[S]) -> Self {
        let rows = values
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                Record::from_iter([
                    ("id".to_string(), AttrValue::S(format!("row-{idx}"))),
                    (attribute.to_string(), AttrValue::S(value.as_ref().to_string())),
                ])
            })
            .collect();
        Self::from_records(rows)
    }

    /// Load a table from a JSON file holding an array of plain objects.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Io`] if the file cannot be read, or
    /// [`AccessorError::Read`] if it is not a JSON array of objects.
    pub fn from_json_file(path: &Path) -> Result<Self, AccessorError> {
        let content = fs::read_to_string(path)?;
        let rows: Vec<Record> =
            serde_json::from_str(&content).map_err(|e| AccessorError::Read {
                operation: "load fixture",
                message: format!("{}: {e}", path.display()),
            })?;
        log::debug!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self::from_records(rows))
    }

    /// Report `value` from the scan even though no row holds it.
    #[must_use]
    pub fn with_phantom_value(mut self, value: impl Into<String>) -> Self {
        self.phantom_values.push(value.into());
        self
    }

    /// Inject a read failure.
    #[must_use]
    pub fn with_read_failure(mut self, failure: ReadFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Number of scans started so far.
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.scans.get()
    }

    /// Number of queries started so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    fn injected_error(operation: &'static str) -> AccessorError {
        AccessorError::Read {
            operation,
            message: "injected failure".to_string(),
        }
    }
}

/// Yields `rows`, then `Err` once if `fail_after` is reached.
fn failing_cursor<'a, I>(rows: I, fail_after: Option<usize>, operation: &'static str) -> RecordCursor<'a>
where
    I: Iterator<Item = Record> + 'a,
{
    match fail_after {
        None => Box::new(rows.map(Ok)),
        Some(after) => Box::new(
            rows.take(after)
                .map(Ok)
                .chain(std::iter::once(Err(MemoryTable::injected_error(operation)))),
        ),
    }
}

impl TableAccessor for MemoryTable {
    fn scan_attribute<'a>(&'a self, attribute: &str) -> Result<RecordCursor<'a>, AccessorError> {
        self.scans.set(self.scans.get() + 1);
        let attribute = attribute.to_string();

        let phantom_attribute = attribute.clone();
        let phantoms = self.phantom_values.iter().map(move |value| {
            Record::from_iter([(phantom_attribute.clone(), AttrValue::S(value.clone()))])
        });
        let rows = self
            .rows
            .iter()
            .map(move |row| row.project(&attribute))
            .chain(phantoms);

        let fail_after = match &self.failure {
            Some(ReadFailure::Scan { after }) => Some(*after),
            _ => None,
        };
        Ok(failing_cursor(rows, fail_after, "scan"))
    }

    fn query_by_value<'a>(
        &'a self,
        attribute: &str,
        value: &str,
    ) -> Result<RecordCursor<'a>, AccessorError> {
        self.queries.set(self.queries.get() + 1);
        let attribute = attribute.to_string();
        let wanted = value.to_string();

        let rows = self
            .rows
            .iter()
            .filter(move |row| row.get(&attribute).and_then(AttrValue::as_str) == Some(wanted.as_str()))
            .cloned();

        let fail_after = match &self.failure {
            Some(ReadFailure::Query { value: v, after }) if v == value => Some(*after),
            _ => None,
        };
        Ok(failing_cursor(rows, fail_after, "query"))
    }

    fn describe(&self) -> String {
        format!("memory:{} rows", self.rows.len())
    }
}
