/// A source file that went through a completed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFile {
    pub id: i64,
    pub relative_path: String,
    /// Seconds since the Unix epoch.
    pub processed_at: f64,
}

/// Summary of the tracking store contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total: i64,
    pub oldest: Option<f64>,
    pub newest: Option<f64>,
}
