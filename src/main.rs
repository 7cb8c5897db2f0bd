mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use cli::commands::{Cli, Commands};
use cli::progress::CliReporter;
use cli::signals::{self, EXIT_INTERRUPTED};
use colored::*;
use dotenv::dotenv;
use gp_preprocessor::config::load_configuration;
use gp_preprocessor::retention::RetentionSweeper;
use gp_preprocessor::scheduler::DailyScheduler;
use gp_preprocessor::storage::Database;
use gp_preprocessor::{AppConfig, CancellationToken, Error, MotionPhoto, Pipeline, RunResult};
use tracing::{error, info};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    dotenv().ok();

    let _guard = cli::logging::init_logger();

    let args = Cli::parse();

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let cancel = CancellationToken::new();
    let outcome = match args.command.unwrap_or_default() {
        Commands::Run { once } => run(config, once, &cancel),
        Commands::PrintConfig => print_config(&config),
        Commands::Status => status(&config),
        Commands::Sweep => sweep(config),
    };

    match outcome {
        Ok(()) if cancel.is_cancelled() => {
            info!("Interrupted, exiting");
            ExitCode::from(EXIT_INTERRUPTED as u8)
        }
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_code_for(&err, &cancel),
    }
}

fn exit_code_for(err: &anyhow::Error, cancel: &CancellationToken) -> ExitCode {
    let lib_error = err.chain().find_map(|e| e.downcast_ref::<Error>());

    // A signal also reaches the child tool, so a batch failing right after a
    // stop request counts as an interruption.
    if cancel.is_cancelled() || matches!(lib_error, Some(Error::Cancelled)) {
        info!("Interrupted: {:#}", err);
        return ExitCode::from(EXIT_INTERRUPTED as u8);
    }

    error!("Error: {:#}", err);
    match lib_error {
        Some(e) if e.is_configuration() => ExitCode::from(EXIT_CONFIG),
        _ => ExitCode::from(EXIT_FAILURE),
    }
}

fn run(config: AppConfig, once: bool, cancel: &CancellationToken) -> anyhow::Result<()> {
    let config = config.validate()?;
    config
        .prepare_directories()
        .context("Error preparing target and database directories")?;
    let tool = MotionPhoto::new(&config.motionphoto2_path, config.tool_timeout())?;
    info!("Using motionphoto2 at {}", tool.binary().display());
    info!(
        "PhotoProcessor initialized: scan_days={}, target_retention_days={}",
        config.scan_days, config.target_retention_days
    );

    signals::install(cancel.clone());

    let run_once = once || config.run_once;
    let schedule_time = config.schedule_time.clone();
    let pipeline = Pipeline::new(config, tool).with_cancellation(cancel.clone());
    let reporter = CliReporter::new();

    if run_once {
        run_pass(&pipeline, &reporter)?;
        info!("RUN_ONCE enabled, exiting");
    } else {
        let scheduler = DailyScheduler::new(&schedule_time)?;
        scheduler.run(cancel, || run_pass(&pipeline, &reporter).map(|_| ()))?;
    }
    Ok(())
}

fn run_pass(pipeline: &Pipeline<MotionPhoto>, reporter: &CliReporter) -> Result<RunResult, Error> {
    info!("{}", "=".repeat(60));
    info!("Google Photos Preprocessor - Starting run");
    info!("{}", "=".repeat(60));

    let result = pipeline.run(reporter)?;

    info!(
        "Scan: {}, Process: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.process_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files processed in {} batches ({} Live Photo pairs, {} singles)",
        format!("{}", result.files_processed).cyan(),
        format!("{}", result.batches).cyan(),
        format!("{}", result.live_photo_pairs).cyan(),
        format!("{}", result.singles).cyan(),
    );
    info!(
        "{} records swept ({} outputs deleted, {} already gone, {} failed)",
        format!("{}", result.sweep.records_removed).yellow(),
        result.sweep.deleted,
        result.sweep.missing,
        format!("{}", result.sweep.failed).red(),
    );
    info!("{}", "=".repeat(60));
    info!("Run complete");
    info!("{}", "=".repeat(60));
    Ok(result)
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Error rendering configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn status(config: &AppConfig) -> anyhow::Result<()> {
    if !Path::new(&config.db_path).exists() {
        println!("No tracking store at {}", config.db_path.display());
        return Ok(());
    }
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Error opening {}", config.db_path.display()))?;
    let stats = db.stats()?;

    println!(
        "{} files tracked in {}",
        format!("{}", stats.total).cyan(),
        config.db_path.display()
    );
    if let Some(oldest) = stats.oldest.and_then(format_timestamp) {
        println!("  oldest record: {}", oldest);
    }
    if let Some(newest) = stats.newest.and_then(format_timestamp) {
        println!("  newest record: {}", newest);
    }
    Ok(())
}

fn sweep(config: AppConfig) -> anyhow::Result<()> {
    let config = config.validate()?;
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Error opening {}", config.db_path.display()))?;
    let stats =
        RetentionSweeper::new(&db, &config.target_dir, config.target_retention_days).sweep()?;
    info!(
        "{} records swept ({} outputs deleted, {} already gone, {} failed)",
        format!("{}", stats.records_removed).yellow(),
        stats.deleted,
        stats.missing,
        format!("{}", stats.failed).red(),
    );
    Ok(())
}

fn format_timestamp(secs: f64) -> Option<String> {
    DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
}
