use crate::cancel::CancellationToken;
use crate::config::AppConfig;
use crate::error::Error;
use crate::executor::{BatchExecutor, Transformer};
use crate::grouping::{group_live_photos, schedule_batches};
use crate::progress::ProgressReporter;
use crate::retention::{RetentionSweeper, SweepStats};
use crate::scanner::{self, ScanOptions};
use crate::storage::Database;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct Pipeline<T: Transformer> {
    config: AppConfig,
    transformer: T,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RunResult {
    pub scan_duration: Duration,
    pub process_duration: Duration,
    pub candidates: usize,
    pub live_photo_pairs: usize,
    pub singles: usize,
    pub batches: usize,
    pub files_processed: usize,
    pub sweep: SweepStats,
    pub tracked_total: i64,
}

impl<T: Transformer> Pipeline<T> {
    /// `config` is expected to have passed [`AppConfig::validate`].
    pub fn new(config: AppConfig, transformer: T) -> Self {
        Self {
            config,
            transformer,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one pass:
    /// 1. Scan the source tree for untracked media files
    /// 2. Group Live Photo pairs and pack batches
    /// 3. Stage, transform and record each batch in order
    /// 4. Sweep outputs older than the retention window
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<RunResult, Error> {
        let config = &self.config;
        info!("Source: {}", config.source_dir.display());
        info!("Target: {}", config.target_dir.display());
        info!("Database: {}", config.db_path.display());
        info!("Scan window: {} days", config.scan_days);
        info!("Target retention: {} days", config.target_retention_days);

        let db = Database::open(&config.db_path)?;
        let mut result = RunResult::default();

        // Phase 1: Scan
        reporter.on_scan_start(&config.source_dir.to_string_lossy());
        let scan_start = Instant::now();
        let options = ScanOptions {
            scan_days: config.scan_days,
            ignore_patterns: config.ignore_globs()?,
            timeout: config.scan_timeout(),
        };
        let candidates = scanner::scan_source_directory(&config.source_dir, &options, &db)?;
        result.scan_duration = scan_start.elapsed();
        result.candidates = candidates.len();
        reporter.on_scan_complete(candidates.len(), result.scan_duration.as_secs_f64());

        // Phase 2: Group and batch
        let process_start = Instant::now();
        if candidates.is_empty() {
            info!("No new or modified files to process");
        } else {
            info!("Processing {} files...", candidates.len());
            let grouping = group_live_photos(candidates);
            result.live_photo_pairs = grouping.pairs.len();
            result.singles = grouping.singles.len();
            info!(
                "Found {} Live Photo pairs and {} single files",
                result.live_photo_pairs, result.singles
            );

            let batches = schedule_batches(grouping, config.batch_size);
            result.batches = batches.len();
            reporter.on_grouping_complete(result.live_photo_pairs, result.singles, batches.len());

            // Phase 3: Execute
            let executor = BatchExecutor::new(
                &db,
                &self.transformer,
                &config.target_dir,
                config.staging_root(),
            )
            .with_cancellation(self.cancel.clone());
            result.files_processed = executor.execute(&batches, reporter)?;
            info!("Processing complete: {} files", result.files_processed);
        }
        result.process_duration = process_start.elapsed();

        // Phase 4: Retention
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        result.sweep = RetentionSweeper::new(
            &db,
            &config.target_dir,
            config.target_retention_days,
        )
        .sweep()?;
        reporter.on_sweep_complete(result.sweep.records_removed);

        result.tracked_total = db.count()?;
        info!("Total processed files in DB: {}", result.tracked_total);
        debug!("Run result: {:?}", result);
        Ok(result)
    }
}
