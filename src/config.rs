use crate::error::Error;
use crate::scheduler;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub db_path: PathBuf,
    pub motionphoto2_path: PathBuf,
    pub run_once: bool,
    pub schedule_time: String,
    pub scan_days: i64,
    pub target_retention_days: i64,
    pub batch_size: usize,
    pub tool_timeout_secs: u64,
    pub scan_timeout_secs: u64,
    pub staging_dir: Option<PathBuf>,
    pub ignore_patterns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("/data/source"),
            target_dir: PathBuf::from("/data/output"),
            db_path: PathBuf::from("/data/progress/progress.db"),
            motionphoto2_path: PathBuf::from("/usr/local/bin/motionphoto2"),
            run_once: true,
            schedule_time: "02:00".to_string(),
            scan_days: 30,
            target_retention_days: 30,
            batch_size: DEFAULT_BATCH_SIZE,
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
            staging_dir: None,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Load `Config.toml` (optional) and overlay environment variables such as
/// `SOURCE_DIR` or `SCAN_DAYS`. The result is not validated yet.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Retention may never outlive the scan window, otherwise an output could be
/// swept while its source is still young enough to be rescanned. An
/// unrestricted scan window has nothing to bound retention against, so
/// retention is switched off instead.
pub fn effective_retention_days(scan_days: i64, retention_days: i64) -> Result<i64, Error> {
    if scan_days <= 0 {
        return Ok(0);
    }
    if retention_days > scan_days {
        return Err(Error::InvalidConfig(format!(
            "TARGET_RETENTION_DAYS ({}) cannot exceed SCAN_DAYS ({})",
            retention_days, scan_days
        )));
    }
    Ok(retention_days)
}

impl AppConfig {
    pub fn validate(mut self) -> Result<Self, Error> {
        let retention = effective_retention_days(self.scan_days, self.target_retention_days)?;
        if retention != self.target_retention_days {
            info!(
                "SCAN_DAYS={} scans the whole library, target retention disabled",
                self.scan_days
            );
            self.target_retention_days = retention;
        }

        if self.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        if !self.run_once {
            scheduler::parse_schedule_time(&self.schedule_time)?;
        }

        self.ignore_patterns.retain(|p| !p.trim().is_empty());
        self.ignore_globs()?;

        if !self.source_dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "Source directory does not exist: {}",
                self.source_dir.display()
            )));
        }

        Ok(self)
    }

    /// Create the output directory and the tracking store's parent directory.
    pub fn prepare_directories(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.target_dir)?;
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    pub fn ignore_globs(&self) -> Result<Vec<Pattern>, Error> {
        self.ignore_patterns
            .iter()
            .map(|glob| {
                Pattern::new(glob).map_err(|e| {
                    Error::InvalidConfig(format!("Invalid ignore pattern '{}': {}", glob, e))
                })
            })
            .collect()
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn staging_root(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
