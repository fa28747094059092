//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display a spinner while the table is scanned and a bar while the distinct
//! index values are queried.
//!
//! Progress is drawn on stderr, so it never mixes with the summary printed on
//! stdout.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used while scanning the table for index values.
pub const PHASE_SCAN: &str = "scan";
/// Phase name used while querying each distinct value.
pub const PHASE_QUERY: &str = "query";

static SHARED_MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// The process-wide bar container on stderr.
///
/// The logger suspends it around every log line, so bars created from it
/// never end up inside emitted records.
pub fn shared_multi() -> &'static MultiProgress {
    SHARED_MULTI.get_or_init(MultiProgress::new)
}

/// Progress callback for the duplicate detection phases.
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_SCAN`] or [`PHASE_QUERY`])
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `label` - Short description of the item
    fn on_progress(&self, current: usize, label: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    scan: Mutex<Option<ProgressBar>>,
    query: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynadupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_multi(shared_multi().clone(), quiet)
    }

    /// Create a reporter drawing to `target` instead of stderr.
    #[must_use]
    pub fn with_draw_target(target: ProgressDrawTarget, quiet: bool) -> Self {
        Self::with_multi(MultiProgress::with_draw_target(target), quiet)
    }

    fn with_multi(multi: MultiProgress, quiet: bool) -> Self {
        Self {
            multi,
            scan: Mutex::new(None),
            query: Mutex::new(None),
            quiet,
        }
    }

    /// The container the bars are drawn in.
    #[must_use]
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }

    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} rows")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn query_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            PHASE_SCAN => Some(&self.scan),
            PHASE_QUERY => Some(&self.query),
            _ => None,
        }
    }

    /// The bar of whichever phase is currently running.
    fn active(&self) -> Option<ProgressBar> {
        for slot in [&self.query, &self.scan] {
            if let Ok(guard) = slot.lock() {
                if let Some(ref pb) = *guard {
                    return Some(pb.clone());
                }
            }
        }
        None
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            PHASE_SCAN => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::scan_style());
                pb.set_message("Scanning index values");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            _ => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::query_style());
                pb.set_message("Checking values");
                pb
            }
        };

        if let Some(slot) = self.slot(phase) {
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(pb);
            }
        }
    }

    fn on_progress(&self, current: usize, label: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.active() {
            pb.set_position(current as u64);
            if !label.is_empty() {
                pb.set_message(truncate_label(label, 30));
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let Some(slot) = self.slot(phase) else {
            return;
        };
        if let Some(pb) = slot.lock().ok().and_then(|mut guard| guard.take()) {
            match phase {
                PHASE_SCAN => pb.finish_with_message("Scan complete"),
                _ => pb.finish_with_message("Queries complete"),
            }
        }
    }
}

/// Truncate an index value for display in the progress bar.
fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let head: String = label.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label_short() {
        assert_eq!(truncate_label("abc", 30), "abc");
    }

    #[test]
    fn test_truncate_label_long() {
        let label = "a".repeat(40);
        let truncated = truncate_label(&label, 10);
        assert_eq!(truncated, "aaaaaaa...");
        assert_eq!(truncated.chars().count(), 10);
    }

    #[test]
    fn test_truncate_label_multibyte() {
        let label = "ü".repeat(20);
        assert_eq!(truncate_label(&label, 5).chars().count(), 5);
    }

    #[test]
    fn test_quiet_progress_ignores_events() {
        let progress = Progress::new(true);
        progress.on_phase_start(PHASE_SCAN, 0);
        progress.on_progress(1, "x");
        progress.on_phase_end(PHASE_SCAN);
        assert!(progress.active().is_none());
    }

    #[test]
    fn test_phase_lifecycle() {
        let progress = Progress::with_draw_target(ProgressDrawTarget::hidden(), false);
        progress.on_phase_start(PHASE_QUERY, 3);
        assert!(progress.active().is_some());
        progress.on_progress(2, "value");
        progress.on_phase_end(PHASE_QUERY);
        assert!(progress.active().is_none());
    }

    #[test]
    fn test_output_while_bar_active_runs_suspended() {
        let progress = Progress::with_draw_target(ProgressDrawTarget::hidden(), false);
        progress.on_phase_start(PHASE_QUERY, 10);
        progress.on_progress(4, "value");

        let written = progress.multi().suspend(|| "record line".to_string());
        assert_eq!(written, "record line");

        let pb = progress.active().unwrap();
        assert_eq!(pb.position(), 4);
        progress.on_phase_end(PHASE_QUERY);
    }

    #[test]
    fn test_progress_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Progress>();
    }
}
