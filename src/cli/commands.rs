use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gp-preprocessor")]
#[command(about = "Batch new photos and Live Photo pairs through motionphoto2", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process new files now, or daily at SCHEDULE_TIME when RUN_ONCE=false
    Run {
        /// Run a single pass even if RUN_ONCE=false
        #[arg(long)]
        once: bool,
    },
    /// Print configuration values
    PrintConfig,
    /// Show how many files are tracked as processed
    Status,
    /// Only delete outputs older than TARGET_RETENTION_DAYS
    Sweep,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run { once: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_once() {
        let cli = Cli::parse_from(["gp-preprocessor", "run", "--once"]);
        assert!(matches!(cli.command, Some(Commands::Run { once: true })));

        let cli = Cli::parse_from(["gp-preprocessor"]);
        assert!(cli.command.is_none());

        let cli = Cli::parse_from(["gp-preprocessor", "print-config"]);
        assert!(matches!(cli.command, Some(Commands::PrintConfig)));
    }
}
