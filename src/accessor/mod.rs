//! Table access layer.
//!
//! The duplicate finder never talks to a storage engine directly. It
//! consumes the [`TableAccessor`] trait, which exposes exactly two reads:
//!
//! * [`TableAccessor::scan_attribute`] - a full table scan projecting one
//!   attribute, yielding one record per physical row (repeats included)
//! * [`TableAccessor::query_by_value`] - an equality lookup on the secondary
//!   index, yielding every row whose attribute equals the given value
//!
//! Both return a [`RecordCursor`]: a finite, single-pass iterator that pulls
//! pages from the backend lazily, so a caller never holds more than one
//! page in memory.
//!
//! # Implementations
//!
//! * [`dynamo::DynamoTableAccessor`]: AWS DynamoDB via the official SDK
//! * [`memory::MemoryTable`]: an in-memory table for tests and offline runs

pub mod dynamo;
pub mod memory;
pub mod record;

pub use dynamo::{ConnectSettings, DynamoTableAccessor};
pub use memory::MemoryTable;
pub use record::{AttrValue, Record};

/// A lazy, finite, non-restartable sequence of records.
///
/// Each item is either the next record or the read failure that ended the
/// sequence. After an `Err` the cursor yields `None`.
pub type RecordCursor<'a> = Box<dyn Iterator<Item = Result<Record, AccessorError>> + 'a>;

/// Errors raised by a table accessor.
#[derive(thiserror::Error, Debug)]
pub enum AccessorError {
    /// The table or region could not be reached at connect time.
    #[error("Cannot connect to table '{table}' in region '{region}': {message}")]
    Connection {
        /// Region identifier
        region: String,
        /// Table name
        table: String,
        /// Backend error description
        message: String,
    },

    /// A scan or query failed while streaming results.
    #[error("{operation} failed: {message}")]
    Read {
        /// The read that failed ("scan" or "query")
        operation: &'static str,
        /// Backend error description
        message: String,
    },

    /// A local resource needed by the accessor could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccessorError {
    /// Whether this error happened while establishing the session.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Abstract read access to one table.
///
/// Implementations resolve their own credentials and pagination; the
/// caller only sees record cursors. Only string-typed index attributes are
/// supported.
pub trait TableAccessor {
    /// Read every row of the table, projecting only `attribute`.
    ///
    /// Returns one record per physical row. Rows that do not carry the
    /// attribute come back as empty records. Deduplication is the caller's
    /// responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::Read`] if the first page cannot be requested.
    /// Later page failures surface as `Err` items of the cursor.
    fn scan_attribute<'a>(&'a self, attribute: &str) -> Result<RecordCursor<'a>, AccessorError>;

    /// Read every row whose `attribute` equals `value` through the
    /// secondary index. Row order is implementation-defined.
    ///
    /// # Errors
    ///
    /// Same contract as [`TableAccessor::scan_attribute`].
    fn query_by_value<'a>(
        &'a self,
        attribute: &str,
        value: &str,
    ) -> Result<RecordCursor<'a>, AccessorError>;

    /// Human-readable label of the backing table, used in log messages.
    fn describe(&self) -> String;
}

impl<T: TableAccessor + ?Sized> TableAccessor for Box<T> {
    fn scan_attribute<'a>(&'a self, attribute: &str) -> Result<RecordCursor<'a>, AccessorError> {
        (**self).scan_attribute(attribute)
    }

    fn query_by_value<'a>(
        &'a self,
        attribute: &str,
        value: &str,
    ) -> Result<RecordCursor<'a>, AccessorError> {
        (**self).query_by_value(attribute, value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = AccessorError::Connection {
            region: "eu-central-1".into(),
            table: "users".into(),
            message: "ResourceNotFoundException".into(),
        };
        assert!(err.is_connection());
        assert_eq!(
            err.to_string(),
            "Cannot connect to table 'users' in region 'eu-central-1': ResourceNotFoundException"
        );
    }

    #[test]
    fn test_read_error_display() {
        let err = AccessorError::Read {
            operation: "scan",
            message: "throttled".into(),
        };
        assert!(!err.is_connection());
        assert_eq!(err.to_string(), "scan failed: throttled");
    }

    #[test]
    fn test_boxed_accessor_delegates() {
        let table = MemoryTable::from_records(vec![Record::from_iter([(
            "email",
            AttrValue::S("a".into()),
        )])]);
        let boxed: Box<dyn TableAccessor> = Box::new(table);
        assert_eq!(boxed.describe(), "memory:1 rows");
        assert_eq!(boxed.scan_attribute("email").unwrap().count(), 1);
    }
}
