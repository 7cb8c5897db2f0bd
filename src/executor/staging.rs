use crate::error::Error;
use crate::model::CandidateFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tracing::debug;

/// Ephemeral directory mirroring a batch's relative layout with symlinks to
/// the real files. No bytes are copied; the tool only reads through the
/// links.
///
/// Call [`StagingArea::remove`] to delete it and observe failures. Dropping
/// it without `remove` still deletes it on a best-effort basis.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a uniquely named directory under `parent` and link every file
    /// of the batch into it. Names combine a nanosecond timestamp with a
    /// random suffix so concurrent runs do not collide.
    pub fn create(parent: &Path, files: &[CandidateFile]) -> Result<Self, Error> {
        fs::create_dir_all(parent).map_err(|source| Error::Staging {
            path: parent.to_path_buf(),
            source,
        })?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = tempfile::Builder::new()
            .prefix(&format!("gp_processor_{}_", nanos))
            .tempdir_in(parent)
            .map_err(|source| Error::Staging {
                path: parent.to_path_buf(),
                source,
            })?;

        let staging = StagingArea { dir };
        for file in files {
            staging.link(file)?;
        }

        debug!(
            "Created staging directory with {} symlinks: {}",
            files.len(),
            staging.path().display()
        );
        Ok(staging)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn remove(self) -> Result<(), Error> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|source| Error::Unstage {
            path: path.clone(),
            source,
        })?;
        debug!("Cleaned up staging directory: {}", path.display());
        Ok(())
    }

    fn link(&self, file: &CandidateFile) -> Result<(), Error> {
        let link: PathBuf = self.dir.path().join(&file.relative_path);
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Staging {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        symlink_file(&file.absolute_path, &link).map_err(|source| Error::Staging {
            path: link.clone(),
            source,
        })?;
        debug!(
            "Created symlink: {} -> {}",
            file.absolute_path.display(),
            link.display()
        );
        Ok(())
    }
}

#[cfg(unix)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}
