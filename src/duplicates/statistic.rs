//! Duplicate counters.
//!
//! [`Statistic`] accumulates the two numbers a run reports:
//!
//! * `total` - rows that belong to a duplicate group, summed over groups
//! * `duplicated_items` - distinct index values whose group has 2+ rows
//!
//! Since every counted group has at least two rows,
//! `total >= 2 * duplicated_items` always holds.
//!
//! # Example
//!
//! ```
//! use dynadupe::duplicates::Statistic;
//!
//! let mut stats = Statistic::new();
//! stats.increment_duplicated_items();
//! stats.increment_total();
//! stats.increment_total();
//!
//! assert_eq!(stats.duplicated_items(), 1);
//! assert_eq!(stats.total(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Counters for one detection run.
///
/// Plain counters with no validation. Owned by a single run; combine
/// independent partial results with [`Statistic::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    total: u64,
    duplicated_items: u64,
}

impl Statistic {
    /// Create an empty statistic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more row belonging to a duplicate group.
    pub fn increment_total(&mut self) {
        self.total += 1;
    }

    /// Count one more duplicate group.
    pub fn increment_duplicated_items(&mut self) {
        self.duplicated_items += 1;
    }

    /// Rows in duplicate groups, summed over all groups.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of index values shared by 2+ rows.
    #[must_use]
    pub fn duplicated_items(&self) -> u64 {
        self.duplicated_items
    }

    /// Whether any duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.duplicated_items > 0
    }

    /// Add another partial statistic into this one.
    pub fn merge(&mut self, other: &Statistic) {
        self.total += other.total;
        self.duplicated_items += other.duplicated_items;
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Duplicated items - {}, Total - {}",
            self.duplicated_items, self.total
        )
    }
}
