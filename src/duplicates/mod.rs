//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Collecting the distinct values of the index attribute (one full scan)
//! - Querying each value and classifying its group as empty, singleton or duplicate
//! - Accumulating the run [`Statistic`]

pub mod finder;
pub mod sink;
pub mod statistic;

pub use finder::{
    collect_distinct_values, tally_group, DistinctValues, DuplicateFinder, FinderConfig,
    FinderError, GroupOutcome, ScanSummary,
};
pub use sink::{DuplicateSink, NoopSink, SinkError};
pub use statistic::Statistic;
