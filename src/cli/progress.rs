use gp_preprocessor::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (total unknown upfront)
/// - Batch phase: progress bar over batches
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, source_dir: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(format!("Scanning {}...", source_dir));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_complete(&self, candidates: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} new files in {:.2}s",
            candidates, duration_secs
        );
    }

    fn on_grouping_complete(&self, pairs: usize, singles: usize, batches: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Grouped {} Live Photo pairs and {} singles into {} batches",
            pairs, singles, batches
        );
        let pb = ProgressBar::new(batches as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Batches [{bar:30.cyan/dim}] {pos}/{len} ({eta} remaining) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_batch_start(&self, index: usize, _total: usize, files: usize) {
        self.with_bar(|pb| pb.set_message(format!("batch {} ({} files)", index, files)));
    }

    fn on_batch_complete(&self, index: usize, total: usize, _files: usize, _duration_secs: f64) {
        self.with_bar(|pb| pb.set_position(index as u64));
        if index == total {
            self.finish_bar();
            eprintln!("  \x1b[32m✓\x1b[0m All {} batches complete", total);
        }
    }

    fn on_sweep_complete(&self, records_removed: usize) {
        self.finish_bar();
        if records_removed > 0 {
            eprintln!(
                "  \x1b[32m✓\x1b[0m Retention sweep released {} records",
                records_removed
            );
        }
    }
}
