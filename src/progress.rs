/// Trait for reporting pipeline progress.
///
/// The CLI implements it with indicatif bars; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _source_dir: &str) {}
    fn on_scan_complete(&self, _candidates: usize, _duration_secs: f64) {}
    fn on_grouping_complete(&self, _pairs: usize, _singles: usize, _batches: usize) {}
    fn on_batch_start(&self, _index: usize, _total: usize, _files: usize) {}
    fn on_batch_complete(&self, _index: usize, _total: usize, _files: usize, _duration_secs: f64) {}
    fn on_sweep_complete(&self, _records_removed: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
