//! DynaDupe - duplicate finder for DynamoDB secondary indexes
//!
//! Scans a table for every value of one string attribute, queries the
//! secondary index for each distinct value, and reports the values held by
//! more than one record. Every record of such a group is logged as JSON and
//! the run ends with a two-number summary: how many values are duplicated
//! and how many records those groups hold in total.
//!
//! The crate is usable as a library through [`accessor::TableAccessor`] and
//! [`duplicates::DuplicateFinder`]; [`run_app`] wires the pieces together for
//! the `dynadupe` binary.

pub mod accessor;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::accessor::{DynamoTableAccessor, MemoryTable, TableAccessor};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, NoopSink, ScanSummary};
use crate::error::ExitCode;
use crate::output::{CsvExport, JsonOutput, JsonTarget};
use crate::progress::Progress;

/// Run one duplicate search as described by `cli`.
///
/// Returns the exit code of a completed run. Failures (connection, read,
/// non-string index values, interruption) come back as errors; map them with
/// [`ExitCode::for_error`].
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the table cannot be
/// opened, the search fails, or output cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_app_with_output(cli, &mut out)
}

/// [`run_app`] writing the summary to `out` instead of stdout.
///
/// # Errors
///
/// Same as [`run_app`].
pub fn run_app_with_output<W: Write>(cli: Cli, out: &mut W) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.merge_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let accessor = open_accessor(&cli, &config)?;

    let progress = Arc::new(Progress::new(cli.quiet || !config.progress));
    let finder_config = FinderConfig::default()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);
    let finder = DuplicateFinder::new(accessor.as_ref(), finder_config);

    let summary = match &cli.export {
        Some(path) => {
            let mut export = CsvExport::create(path)
                .with_context(|| format!("Failed to create export file {}", path.display()))?;
            let summary = finder.find_duplicates_with_sink(&cli.index_attribute, &mut export)?;
            log::info!(
                "Exported {} duplicate groups to {}",
                export.groups_written(),
                path.display()
            );
            summary
        }
        None => finder.find_duplicates_with_sink(&cli.index_attribute, &mut NoopSink)?,
    };

    report(&cli, &summary, out)?;
    Ok(ExitCode::Success)
}

fn open_accessor(cli: &Cli, config: &Config) -> Result<Box<dyn TableAccessor>> {
    if let Some(path) = &cli.fixture {
        log::debug!("Using fixture {} instead of DynamoDB", path.display());
        let table = MemoryTable::from_json_file(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        return Ok(Box::new(table));
    }

    let settings = config.connect_settings(&cli.region, &cli.table);
    let table = DynamoTableAccessor::connect(&settings)
        .with_context(|| format!("Failed to open table '{}'", cli.table))?;
    Ok(Box::new(table))
}

fn report<W: Write>(cli: &Cli, summary: &ScanSummary, out: &mut W) -> Result<()> {
    match cli.output {
        OutputFormat::Text => {
            writeln!(out, "{}", output::summary_line(&summary.statistic))
                .context("Failed to write summary")?;
        }
        OutputFormat::Json => {
            let target = JsonTarget {
                region: cli.region.clone(),
                table: match &cli.fixture {
                    Some(path) => path.display().to_string(),
                    None => cli.table.clone(),
                },
                index_attribute: cli.index_attribute.clone(),
            };
            JsonOutput::new(target, summary, ExitCode::Success)
                .write_to(out, true)
                .context("Failed to write JSON report")?;
        }
    }
    Ok(())
}
