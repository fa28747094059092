//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! The level comes from, in priority order:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only) or `--verbose` (`-v` debug, `-vv` trace)
//! 3. Info
//!
//! Duplicate records are emitted at info level as single-line JSON, so the
//! default format keeps the line body untouched after the level tag. Every
//! line is written while the progress bars are suspended, so bar redraws
//! never interleave with a record.
//!
//! ```rust,no_run
//! use dynadupe::logging::init_logging;
//!
//! init_logging(0, false);
//! log::info!("Started search of duplicates");
//! ```

use env_logger::{Builder, Target};
use indicatif::MultiProgress;
use log::{LevelFilter, Log, Metadata, Record};
use std::env;
use std::io::Write;

use crate::progress::shared_multi;

/// Logger that clears the progress bars while a line is written.
pub struct ProgressLogger<L> {
    inner: L,
    multi: MultiProgress,
}

impl<L: Log> ProgressLogger<L> {
    /// Wrap `inner` so its output is coordinated with `multi`.
    #[must_use]
    pub fn new(inner: L, multi: MultiProgress) -> Self {
        Self { inner, multi }
    }
}

impl<L: Log> Log for ProgressLogger<L> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if self.inner.enabled(record.metadata()) {
            self.multi.suspend(|| self.inner.log(record));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initialize the global logger from the CLI verbosity flags.
///
/// Logs go to stderr so stdout carries only the summary. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    builder.target(Target::Stderr);
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    let logger = builder.build();
    let max_level = logger.filter();
    let wrapped = ProgressLogger::new(logger, shared_multi().clone());
    if log::set_boxed_logger(Box::new(wrapped)).is_err() {
        log::trace!("Logger already initialized");
        return;
    }
    log::set_max_level(max_level);

    if from_env {
        log::debug!("Logging configured from RUST_LOG={:?}", env::var("RUST_LOG").ok());
    } else {
        log::debug!("Logging initialized at level: {:?}", determine_level(verbose, quiet));
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    if verbose == 0 {
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(buf, "{style}{level:<5}{style:#} {}", record.args())
        });
    } else {
        builder.format(|buf, record| {
            let level = record.level();
            let style = buf.default_level_style(level);
            writeln!(
                buf,
                "{} {style}{level:<5}{style:#} [{}] {}",
                buf.timestamp_millis(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::{ProgressBar, ProgressDrawTarget};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_determine_level_default() {
        assert_eq!(determine_level(0, false), LevelFilter::Info);
    }

    #[test]
    fn test_determine_level_verbose() {
        assert_eq!(determine_level(1, false), LevelFilter::Debug);
        assert_eq!(determine_level(2, false), LevelFilter::Trace);
        assert_eq!(determine_level(7, false), LevelFilter::Trace);
    }

    #[test]
    fn test_determine_level_quiet_overrides_verbose() {
        assert_eq!(determine_level(0, true), LevelFilter::Error);
        assert_eq!(determine_level(2, true), LevelFilter::Error);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(0, true);
        init_logging(1, false);
    }

    #[derive(Default)]
    struct Lines(Arc<Mutex<Vec<String>>>);

    impl Log for Lines {
        fn enabled(&self, metadata: &Metadata<'_>) -> bool {
            metadata.level() <= log::Level::Info
        }

        fn log(&self, record: &Record<'_>) {
            self.0.lock().unwrap().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    #[test]
    fn test_progress_logger_forwards_enabled_lines() {
        let lines = Lines::default();
        let seen = Arc::clone(&lines.0);
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let bar = multi.add(ProgressBar::new(10));
        bar.set_position(3);
        let logger = ProgressLogger::new(lines, multi);

        logger.log(
            &Record::builder()
                .args(format_args!(r#"{{"email":"a@x.io"}}"#))
                .level(log::Level::Info)
                .target("dynadupe")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("hidden"))
                .level(log::Level::Debug)
                .target("dynadupe")
                .build(),
        );

        assert_eq!(*seen.lock().unwrap(), vec![r#"{"email":"a@x.io"}"#.to_string()]);
        assert_eq!(bar.position(), 3);
    }
}
