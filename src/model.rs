use std::path::PathBuf;

/// A media file found by the scanner that is not yet tracked as processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// `/`-separated path relative to the source root. Identity key in the
    /// tracking store.
    pub relative_path: String,
    pub absolute_path: PathBuf,
}

impl CandidateFile {
    pub fn new(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }
}
