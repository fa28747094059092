//! Duplicate finder implementation.
//!
//! # Overview
//!
//! This module orchestrates duplicate detection over a [`TableAccessor`]:
//! 1. **Scan**: read the index attribute of every row and keep the distinct
//!    values ([`collect_distinct_values`])
//! 2. **Query**: for each distinct value, stream the rows holding it and
//!    classify the group ([`tally_group`])
//! 3. **Summary**: log and return the accumulated [`Statistic`]
//!
//! Groups are never materialized. [`tally_group`] pulls records one at a
//! time and only keeps the first record until it knows whether a second one
//! exists, so memory stays constant however large a group is.
//!
//! # Example
//!
//! ```
//! use dynadupe::accessor::MemoryTable;
//! use dynadupe::duplicates::DuplicateFinder;
//!
//! let table = MemoryTable::from_values("email", &["a", "a", "b", "b", "b", "c"]);
//! let finder = DuplicateFinder::with_defaults(&table);
//!
//! let stats = finder.find_duplicates("email").unwrap();
//! assert_eq!(stats.duplicated_items(), 2);
//! assert_eq!(stats.total(), 5);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::accessor::{AccessorError, AttrValue, Record, TableAccessor};
use crate::progress::{ProgressCallback, PHASE_QUERY, PHASE_SCAN};

use super::sink::{DuplicateSink, NoopSink};
use super::statistic::Statistic;

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.is_shutdown_requested() {
            Err(FinderError::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Errors that can occur during duplicate finding.
///
/// Any error aborts the run; the counters accumulated so far are dropped.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The run was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Search interrupted by user")]
    Interrupted,

    /// The table accessor failed to connect or to read.
    #[error(transparent)]
    Accessor(#[from] AccessorError),

    /// A row holds a non-string value in the index attribute.
    #[error("Index attribute '{attribute}' must be a string, found type {found}")]
    NonStringIndexValue {
        /// Index attribute name
        attribute: String,
        /// DynamoDB type descriptor of the offending value
        found: &'static str,
    },

    /// The duplicate sink rejected a record.
    #[error("Failed to write duplicate record: {0}")]
    Sink(String),
}

/// Distinct index values discovered by the scan.
#[derive(Debug, Clone, Default)]
pub struct DistinctValues {
    /// The distinct values, in no particular order
    pub values: HashSet<String>,
    /// Rows visited by the scan
    pub rows_scanned: u64,
    /// Rows that do not carry the index attribute
    pub rows_without_value: u64,
}

/// Classification of one index value's group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// The query returned no rows at all.
    Empty,
    /// Exactly one row holds the value.
    Singleton,
    /// Two or more rows share the value.
    Duplicate {
        /// Number of rows in the group
        size: u64,
    },
}

/// Summary of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// The duplicate counters
    pub statistic: Statistic,
    /// Number of distinct index values
    pub distinct_values: u64,
    /// Rows visited by the scan
    pub rows_scanned: u64,
    /// Scanned rows without the index attribute
    pub rows_without_value: u64,
    /// Values whose query returned nothing
    pub empty_groups: u64,
    /// Values held by exactly one row
    pub singleton_groups: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

/// Read every row's index value and keep the distinct ones.
///
/// Rows that lack the attribute are skipped: a sparse secondary index does
/// not contain them, so they can never be part of a group.
///
/// # Errors
///
/// - [`FinderError::Accessor`] if the scan fails at any page
/// - [`FinderError::NonStringIndexValue`] on the first non-string value
/// - [`FinderError::Interrupted`] if shutdown is requested mid-scan
pub fn collect_distinct_values<A: TableAccessor + ?Sized>(
    accessor: &A,
    attribute: &str,
    config: &FinderConfig,
) -> Result<DistinctValues, FinderError> {
    let mut distinct = DistinctValues::default();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_SCAN, 0);
    }

    for row in accessor.scan_attribute(attribute)? {
        config.check_shutdown()?;
        let row = row?;
        distinct.rows_scanned += 1;

        match row.get(attribute) {
            Some(AttrValue::S(value)) => {
                if !distinct.values.contains(value.as_str()) {
                    distinct.values.insert(value.clone());
                }
            }
            Some(other) => {
                return Err(FinderError::NonStringIndexValue {
                    attribute: attribute.to_string(),
                    found: other.type_name(),
                });
            }
            None => distinct.rows_without_value += 1,
        }

        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(distinct.rows_scanned as usize, "");
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_SCAN);
    }

    if distinct.rows_without_value > 0 {
        log::debug!(
            "{} of {} rows have no '{}' attribute",
            distinct.rows_without_value,
            distinct.rows_scanned,
            attribute
        );
    }
    log::debug!(
        "Scan found {} distinct values in {} rows",
        distinct.values.len(),
        distinct.rows_scanned
    );

    Ok(distinct)
}

/// Classify one group and count it.
///
/// Pulls the first record; if there is none the group is empty and nothing
/// happens. Pulls a second; if there is none the group is a singleton and
/// nothing happens. Otherwise `duplicated_items` grows by one and every
/// record of the group, first included, adds one to `total` and is emitted.
///
/// # Errors
///
/// Returns [`FinderError::Accessor`] if the record stream fails and
/// [`FinderError::Sink`] if the sink rejects a record. Counters updated
/// before the failure stay updated.
pub fn tally_group<I>(
    value: &str,
    mut records: I,
    statistic: &mut Statistic,
    sink: &mut dyn DuplicateSink,
) -> Result<GroupOutcome, FinderError>
where
    I: Iterator<Item = Result<Record, AccessorError>>,
{
    let Some(first) = records.next().transpose()? else {
        return Ok(GroupOutcome::Empty);
    };
    let Some(second) = records.next().transpose()? else {
        return Ok(GroupOutcome::Singleton);
    };

    statistic.increment_duplicated_items();
    emit(value, 1, &first, statistic, sink)?;
    drop(first);
    emit(value, 2, &second, statistic, sink)?;
    drop(second);

    let mut size = 2;
    for record in records {
        let record = record?;
        size += 1;
        emit(value, size, &record, statistic, sink)?;
    }

    Ok(GroupOutcome::Duplicate { size })
}

fn emit(
    value: &str,
    position: u64,
    record: &Record,
    statistic: &mut Statistic,
    sink: &mut dyn DuplicateSink,
) -> Result<(), FinderError> {
    statistic.increment_total();
    log::info!("{}", record.to_json());
    sink.on_duplicate_record(value, position, record)
        .map_err(|e| FinderError::Sink(e.to_string()))
}

/// Duplicate finder over one table.
///
/// The finder borrows its accessor, so the same accessor can be inspected
/// or reused after a run.
///
/// # Example
///
/// ```
/// use dynadupe::accessor::MemoryTable;
/// use dynadupe::duplicates::{DuplicateFinder, FinderConfig, NoopSink};
///
/// let table = MemoryTable::from_values("sku", &["x", "y", "x"]);
/// let finder = DuplicateFinder::new(&table, FinderConfig::default());
///
/// let summary = finder.find_duplicates_with_sink("sku", &mut NoopSink).unwrap();
/// assert_eq!(summary.distinct_values, 2);
/// assert_eq!(summary.statistic.total(), 2);
/// ```
pub struct DuplicateFinder<'a, A: TableAccessor + ?Sized> {
    accessor: &'a A,
    config: FinderConfig,
}

impl<'a, A: TableAccessor + ?Sized> DuplicateFinder<'a, A> {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(accessor: &'a A, config: FinderConfig) -> Self {
        Self { accessor, config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults(accessor: &'a A) -> Self {
        Self::new(accessor, FinderConfig::default())
    }

    /// Find every group of rows sharing a value of `attribute`.
    ///
    /// Duplicate rows are logged at info level as JSON.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates_with_sink`].
    pub fn find_duplicates(&self, attribute: &str) -> Result<Statistic, FinderError> {
        self.find_duplicates_with_sink(attribute, &mut NoopSink)
            .map(|summary| summary.statistic)
    }

    /// Find duplicates and forward every duplicate row to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The accessor fails to scan or query
    /// - The index attribute holds a non-string value
    /// - The sink rejects a record
    /// - Shutdown is requested
    pub fn find_duplicates_with_sink(
        &self,
        attribute: &str,
        sink: &mut dyn DuplicateSink,
    ) -> Result<ScanSummary, FinderError> {
        let start_time = Instant::now();
        log::info!(
            "Started search of duplicates on {} by '{}'",
            self.accessor.describe(),
            attribute
        );

        self.config.check_shutdown()?;
        let distinct = collect_distinct_values(self.accessor, attribute, &self.config)?;

        let mut summary = ScanSummary {
            distinct_values: distinct.values.len() as u64,
            rows_scanned: distinct.rows_scanned,
            rows_without_value: distinct.rows_without_value,
            ..Default::default()
        };
        let mut statistic = Statistic::new();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_QUERY, distinct.values.len());
        }

        for (idx, value) in distinct.values.iter().enumerate() {
            self.config.check_shutdown()?;

            let records = self.accessor.query_by_value(attribute, value)?;
            match tally_group(value, records, &mut statistic, sink)? {
                GroupOutcome::Empty => {
                    log::debug!("No rows returned for value {:?}", value);
                    summary.empty_groups += 1;
                }
                GroupOutcome::Singleton => summary.singleton_groups += 1,
                GroupOutcome::Duplicate { size } => {
                    log::debug!("Value {:?} is shared by {} rows", value, size);
                }
            }

            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(idx + 1, value);
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_QUERY);
        }

        sink.finish().map_err(|e| FinderError::Sink(e.to_string()))?;

        summary.statistic = statistic;
        summary.duration = start_time.elapsed();

        log::info!("Finished");
        log::info!("Summary: {}", statistic);

        Ok(summary)
    }
}
