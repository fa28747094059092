//! CSV export of duplicate records.
//!
//! [`CsvExport`] is a [`DuplicateSink`]: rows are written as the finder
//! streams them, one CSV row per duplicate record, so the export never
//! holds a whole group in memory.
//!
//! # Columns
//!
//! - `group_id`: 1-based number of the duplicate group, in discovery order
//! - `index_value`: the shared index value
//! - `position`: 1-based position of the record within its group
//! - `record`: the full record as single-line JSON

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::accessor::Record;
use crate::duplicates::{DuplicateSink, SinkError};

/// Errors that can occur during CSV export.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single row in the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: u64,
    index_value: &'a str,
    position: u64,
    record: String,
}

/// Streaming CSV writer for duplicate records.
pub struct CsvExport<W: Write> {
    writer: csv::Writer<W>,
    group_id: u64,
}

impl CsvExport<BufWriter<File>> {
    /// Create (or truncate) the export file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError::Io` if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, CsvOutputError> {
        let file = File::create(path)?;
        log::debug!("Exporting duplicate records to {}", path.display());
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> CsvExport<W> {
    /// Wrap an arbitrary writer.
    #[must_use]
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            group_id: 0,
        }
    }

    /// Number of groups written so far.
    #[must_use]
    pub fn groups_written(&self) -> u64 {
        self.group_id
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError::Io` if flushing fails.
    pub fn into_inner(self) -> Result<W, CsvOutputError> {
        self.writer
            .into_inner()
            .map_err(|e| CsvOutputError::Io(io::Error::other(e.to_string())))
    }

    fn write_row(&mut self, value: &str, position: u64, record: &Record) -> Result<(), CsvOutputError> {
        if position == 1 {
            self.group_id += 1;
        }
        self.writer.serialize(CsvRow {
            group_id: self.group_id,
            index_value: value,
            position,
            record: record.to_json(),
        })?;
        Ok(())
    }
}

impl<W: Write> DuplicateSink for CsvExport<W> {
    fn on_duplicate_record(
        &mut self,
        value: &str,
        position: u64,
        record: &Record,
    ) -> Result<(), SinkError> {
        self.write_row(value, position, record)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        log::debug!("Exported {} duplicate groups", self.group_id);
        Ok(())
    }
}
