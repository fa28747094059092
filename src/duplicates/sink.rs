//! Destinations for duplicate records.
//!
//! The finder always logs every duplicate-group record. A [`DuplicateSink`]
//! additionally receives each one as it streams past, in group order, so
//! reports can be written without holding groups in memory.

use crate::accessor::Record;

/// Error type returned by sinks.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Receiver of records that belong to a duplicate group.
pub trait DuplicateSink {
    /// Called once per record of a duplicate group.
    ///
    /// # Arguments
    ///
    /// * `value` - The shared index value
    /// * `position` - 1-based position of the record within its group
    /// * `record` - The full record
    ///
    /// # Errors
    ///
    /// A returned error aborts the run.
    fn on_duplicate_record(
        &mut self,
        value: &str,
        position: u64,
        record: &Record,
    ) -> Result<(), SinkError>;

    /// Called once after the last group, on success only.
    ///
    /// # Errors
    ///
    /// A returned error aborts the run.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DuplicateSink for NoopSink {
    fn on_duplicate_record(&mut self, _: &str, _: u64, _: &Record) -> Result<(), SinkError> {
        Ok(())
    }
}
