//! Command-line interface definitions for DynaDupe.
//!
//! The tool takes exactly three positional inputs: the region, the table
//! name and the secondary-index attribute. Anything else is an option. A
//! wrong number of positionals makes clap print the usage text and exit
//! with code 2 before any connection is attempted.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates of the `email` index in table `users`
//! dynadupe eu-central-1 users email
//!
//! # Against DynamoDB Local, JSON summary, CSV export of duplicate rows
//! dynadupe us-east-1 users email --endpoint-url http://localhost:8000 \
//!     --output json --export dupes.csv
//!
//! # Offline run over a JSON array of records
//! dynadupe local users email --fixture users.json
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Find records that share a secondary-index value in a DynamoDB table.
///
/// Scans the table for every value of INDEX_ATTRIBUTE, queries the index for
/// each distinct value, logs every record of a group with 2+ members, and
/// prints how many values are duplicated and how many records they cover.
#[derive(Debug, Parser)]
#[command(name = "dynadupe")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Example: dynadupe eu-central-1 tableName columnName")]
pub struct Cli {
    /// AWS region of the table (e.g. eu-central-1)
    #[arg(value_name = "REGION")]
    pub region: String,

    /// Name of the table to scan
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Secondary-index attribute whose values are compared (string typed)
    #[arg(value_name = "INDEX_ATTRIBUTE")]
    pub index_attribute: String,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and the final summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a TOML configuration file
    ///
    /// If not specified, the platform-specific default location is used
    /// when it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Custom DynamoDB endpoint (e.g. DynamoDB Local)
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Name of the secondary index, if it differs from the attribute name
    #[arg(long, value_name = "NAME")]
    pub index_name: Option<String>,

    /// Maximum number of items per page request
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Format of the final summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write every duplicate record to this CSV file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Read records from a JSON file instead of connecting to DynamoDB
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable summary line
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
