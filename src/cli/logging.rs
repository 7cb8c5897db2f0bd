use std::env;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Log to stdout at `LOG_LEVEL` (default `info`), and additionally to
/// `LOG_FILE_PATH` when set. Keep the returned guard alive for the whole run
/// so buffered file output is flushed.
pub fn init_logger() -> Option<WorkerGuard> {
    let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer =
        EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match env::var("LOG_FILE_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            let path = Path::new(&path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .unwrap_or_else(|| OsStr::new("gp-preprocessor.log"));
            let file_appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(fmt::layer().with_writer(non_blocking).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_ansi(true),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    info!("Tracing is configured at level {}", level);

    guard
}
