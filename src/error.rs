use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Scan of {} failed: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Scan of {} did not finish within {}s", path.display(), timeout.as_secs())]
    ScanTimeout { path: PathBuf, timeout: Duration },

    #[error("Failed to stage batch in {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with {status}: {output}")]
    ToolFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("`{command}` timed out after {}s: {output}", timeout.as_secs())]
    ToolTimeout {
        command: String,
        timeout: Duration,
        output: String,
    },

    #[error("Failed to clean up staging directory {}: {source}", path.display())]
    Unstage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// True for failures detected before any scanning starts.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidConfig(_))
    }
}
