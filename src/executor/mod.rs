pub mod runner;
pub mod staging;
pub mod tool;

pub use staging::StagingArea;
pub use tool::MotionPhoto;

use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::grouping::Batch;
use crate::progress::ProgressReporter;
use crate::storage::Database;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// The external transformation step, treated as a black box.
pub trait Transformer {
    /// Read the files under `input_dir` and write results into
    /// `output_dir`. Returns the step's diagnostic output on success.
    fn transform(&self, input_dir: &Path, output_dir: &Path) -> Result<String, Error>;
}

impl<T: Transformer + ?Sized> Transformer for &T {
    fn transform(&self, input_dir: &Path, output_dir: &Path) -> Result<String, Error> {
        (**self).transform(input_dir, output_dir)
    }
}

/// Runs batches one at a time: stage, transform, record, unstage.
pub struct BatchExecutor<'a, T: Transformer> {
    db: &'a Database,
    transformer: &'a T,
    target_dir: &'a Path,
    staging_root: PathBuf,
    cancel: CancellationToken,
}

impl<'a, T: Transformer> BatchExecutor<'a, T> {
    pub fn new(
        db: &'a Database,
        transformer: &'a T,
        target_dir: &'a Path,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            transformer,
            target_dir,
            staging_root: staging_root.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process `batches` in order and return the number of files in batches
    /// that completed. The first failing batch aborts the rest; batches
    /// recorded before it stay recorded.
    pub fn execute(
        &self,
        batches: &[Batch],
        reporter: &dyn ProgressReporter,
    ) -> Result<usize, Error> {
        let total = batches.len();
        let mut processed = 0;

        for (i, batch) in batches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(
                    "Stop requested, leaving {} of {} batches for the next run",
                    total - i,
                    total
                );
                return Err(Error::Cancelled);
            }

            let number = i + 1;
            info!("Processing batch {}/{} ({} files)", number, total, batch.len());
            reporter.on_batch_start(number, total, batch.len());
            let started = Instant::now();

            self.process_batch(batch)?;

            processed += batch.len();
            info!("Batch {} complete", number);
            reporter.on_batch_complete(number, total, batch.len(), started.elapsed().as_secs_f64());
        }

        Ok(processed)
    }

    /// Stage, transform and record one batch. The staging area is removed
    /// whatever the outcome; a transformation error takes precedence over a
    /// cleanup error, which is then only logged.
    pub fn process_batch(&self, batch: &Batch) -> Result<(), Error> {
        let staging = StagingArea::create(&self.staging_root, &batch.files)?;
        let outcome = self.transform_and_record(staging.path(), batch);
        let cleanup = staging.remove();

        match (outcome, cleanup) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(cleanup_err)) => Err(cleanup_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                error!("{}", cleanup_err);
                Err(err)
            }
        }
    }

    fn transform_and_record(&self, input_dir: &Path, batch: &Batch) -> Result<(), Error> {
        self.transformer.transform(input_dir, self.target_dir)?;

        let paths = batch.relative_paths();
        for path in &paths {
            debug!("Processed: {}", path);
        }
        if !paths.is_empty() {
            self.db.add_processed(&paths)?;
        }
        Ok(())
    }
}
