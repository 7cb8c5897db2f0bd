use crate::error::Error;
use crate::storage::Database;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Output files deleted from the target directory.
    pub deleted: usize,
    /// Aged records whose output was already gone.
    pub missing: usize,
    /// Outputs that could not be deleted; their records stay tracked.
    pub failed: usize,
    pub records_removed: usize,
}

/// Deletes outputs older than the retention window together with their
/// tracking records.
pub struct RetentionSweeper<'a> {
    db: &'a Database,
    target_dir: &'a Path,
    retention_days: i64,
}

impl<'a> RetentionSweeper<'a> {
    pub fn new(db: &'a Database, target_dir: &'a Path, retention_days: i64) -> Self {
        Self {
            db,
            target_dir,
            retention_days,
        }
    }

    /// A Live Photo's video is merged into the image output and never exists
    /// as a target file of its own, so a missing output still releases its
    /// record. Deletion failures are logged and retried on a later run.
    pub fn sweep(&self) -> Result<SweepStats, Error> {
        let mut stats = SweepStats::default();
        if self.retention_days <= 0 {
            debug!("Target retention disabled (target_retention_days=0)");
            return Ok(stats);
        }

        info!(
            "Cleaning up targets older than {} days",
            self.retention_days
        );
        let old_records = self.db.get_old_records(self.retention_days)?;
        if old_records.is_empty() {
            info!("No old records to clean up");
            return Ok(stats);
        }
        info!("Found {} old records to clean up", old_records.len());

        let mut cleaned_paths = Vec::with_capacity(old_records.len());
        for record in old_records {
            let target_path = self.target_dir.join(&record.relative_path);
            match fs::remove_file(&target_path) {
                Ok(()) => {
                    debug!("Deleted old target file: {}", target_path.display());
                    stats.deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(
                        "Target file not found (may be Live Photo video): {}",
                        target_path.display()
                    );
                    stats.missing += 1;
                }
                Err(e) => {
                    warn!("Failed to delete {}: {}", target_path.display(), e);
                    stats.failed += 1;
                    continue;
                }
            }
            cleaned_paths.push(record.relative_path);
        }

        stats.records_removed = self.db.remove_records(&cleaned_paths)?;
        info!(
            "Cleanup complete: {} files deleted, {} skipped (not found), {} failed, {} records removed from DB",
            stats.deleted, stats.missing, stats.failed, stats.records_removed
        );
        Ok(stats)
    }
}
