use super::models::{ProcessedFile, StoreStats};
use super::sqlite::Database;
use rusqlite::{params, params_from_iter, OptionalExtension, Result};
use tracing::{debug, info};

/// Stay below SQLite's historical 999 host-parameter limit.
pub const REMOVE_CHUNK_SIZE: usize = 900;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Current time as fractional seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

impl Database {
    pub fn is_processed(&self, relative_path: &str) -> Result<bool> {
        let found = self
            .connection()
            .query_row(
                "SELECT 1 FROM processed_files WHERE relative_path = ?1",
                params![relative_path],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Record `paths` as processed now. Already-tracked paths get their
    /// timestamp refreshed.
    pub fn add_processed(&self, paths: &[String]) -> Result<usize> {
        self.add_processed_at(paths, unix_now())
    }

    pub fn add_processed_at(&self, paths: &[String], processed_at: f64) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO processed_files (relative_path, processed_at) VALUES (?1, ?2) \
                 ON CONFLICT(relative_path) DO UPDATE SET processed_at = excluded.processed_at",
            )?;
            for path in paths {
                count += stmt.execute(params![path, processed_at])?;
            }
        }
        tx.commit()?;
        info!("Recorded {} processed files", paths.len());
        Ok(count)
    }

    /// Records whose `processed_at` lies more than `retention_days` days in
    /// the past. A non-positive window selects nothing.
    pub fn get_old_records(&self, retention_days: i64) -> Result<Vec<ProcessedFile>> {
        if retention_days <= 0 {
            return Ok(Vec::new());
        }
        let cutoff = unix_now() - retention_days as f64 * SECONDS_PER_DAY;
        self.get_records_older_than(cutoff)
    }

    pub fn get_records_older_than(&self, cutoff: f64) -> Result<Vec<ProcessedFile>> {
        let mut stmt = self.connection().prepare_cached(
            "SELECT id, relative_path, processed_at FROM processed_files \
             WHERE processed_at < ?1 \
             ORDER BY processed_at, id",
        )?;
        let records = stmt
            .query_map(params![cutoff], |row| {
                Ok(ProcessedFile {
                    id: row.get(0)?,
                    relative_path: row.get(1)?,
                    processed_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Delete the given paths in one transaction, chunked to respect the
    /// host-parameter limit. Returns the number of rows removed.
    pub fn remove_records(&self, paths: &[String]) -> Result<usize> {
        if paths.is_empty() {
            return Ok(0);
        }

        let tx = self.connection().unchecked_transaction()?;
        let mut removed = 0;
        for chunk in paths.chunks(REMOVE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "DELETE FROM processed_files WHERE relative_path IN ({})",
                placeholders
            );
            removed += tx.execute(&sql, params_from_iter(chunk.iter()))?;
        }
        tx.commit()?;
        debug!("Removed {} of {} requested records", removed, paths.len());
        Ok(removed)
    }

    pub fn count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM processed_files", [], |row| row.get(0))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.connection().query_row(
            "SELECT COUNT(*), MIN(processed_at), MAX(processed_at) FROM processed_files",
            [],
            |row| {
                Ok(StoreStats {
                    total: row.get(0)?,
                    oldest: row.get(1)?,
                    newest: row.get(2)?,
                })
            },
        )
    }
}
