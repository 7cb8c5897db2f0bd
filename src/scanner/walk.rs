use crate::error::Error;
use crate::media;
use crate::model::CandidateFile;
use crate::storage::Database;
use glob::Pattern;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Only keep files modified within this many days. `<= 0` keeps all.
    pub scan_days: i64,
    pub ignore_patterns: Vec<Pattern>,
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scan_days: 0,
            ignore_patterns: Vec::new(),
            timeout: Duration::from_secs(crate::config::DEFAULT_SCAN_TIMEOUT_SECS),
        }
    }
}

/// Find media files under `root` that the tracking store does not know yet.
/// Returned paths are relative to the canonical root, `/`-separated.
pub fn scan_source_directory(
    root: &Path,
    options: &ScanOptions,
    db: &Database,
) -> Result<Vec<CandidateFile>, Error> {
    let root = fs::canonicalize(root)?;
    info!("Starting scan of {}", root.display());

    let files = walk_media_files(&root, options)?;
    let mut candidates = Vec::new();
    let mut already_processed = 0usize;

    for path in files {
        let Some(rel) = relative_path(&root, &path) else {
            warn!(
                "Skipping {}: no UTF-8 path relative to {}",
                path.display(),
                root.display()
            );
            continue;
        };

        if db.is_processed(&rel)? {
            already_processed += 1;
            continue;
        }
        candidates.push(CandidateFile::new(rel, path));
    }

    info!(
        "Scan complete: {} files to process ({} already processed)",
        candidates.len(),
        already_processed
    );
    Ok(candidates)
}

/// Walk `root` without following symlinks and collect every regular file
/// with a recognised media extension that passes the age and ignore filters.
pub fn walk_media_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, Error> {
    let started = Instant::now();
    let cutoff = modified_cutoff(options.scan_days);
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_ignored(root, entry.path(), &options.ignore_patterns)
        });

    for entry in walker {
        if started.elapsed() >= options.timeout {
            return Err(Error::ScanTimeout {
                path: root.to_path_buf(),
                timeout: options.timeout,
            });
        }

        let entry = entry.map_err(|source| scan_error(root, source))?;
        if !entry.file_type().is_file() || !media::is_media_file(entry.path()) {
            continue;
        }

        if let Some(cutoff) = cutoff {
            let modified = entry
                .metadata()
                .map_err(|source| scan_error(root, source))?
                .modified()?;
            if modified < cutoff {
                continue;
            }
        }

        found.push(entry.into_path());
    }

    debug!(
        "Walked {} in {:.2}s, {} media files matched",
        root.display(),
        started.elapsed().as_secs_f64(),
        found.len()
    );
    Ok(found)
}

/// `path` relative to `root` as a `/`-joined string. `None` when the path
/// is outside the root or not valid UTF-8.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn modified_cutoff(scan_days: i64) -> Option<SystemTime> {
    if scan_days <= 0 {
        return None;
    }
    let window = Duration::from_secs(u64::try_from(scan_days).ok()?.checked_mul(86_400)?);
    SystemTime::now().checked_sub(window)
}

fn is_ignored(root: &Path, path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let rel = relative_path(root, path);
    patterns.iter().any(|pattern| {
        pattern.matches_path(path) || rel.as_deref().is_some_and(|r| pattern.matches(r))
    })
}

fn scan_error(root: &Path, source: walkdir::Error) -> Error {
    let path = source
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    Error::Scan { path, source }
}
