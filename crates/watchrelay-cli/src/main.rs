use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{auth, config, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchrelay")]
#[command(about = "watchrelay - Copy recently watched movies and episodes from Simkl to Trakt")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy items watched on Simkl within the lookback window to Trakt history
    #[command(long_about = "Fetch the Simkl watch history for the lookback window, resolve each episode's Trakt id and append the result to the Trakt history. Meant to be run periodically, e.g. from cron.")]
    Sync {
        /// Fetch, filter and resolve, write the output files, but do not send anything to Trakt
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Override the lookback window from the config (hours)
        #[arg(long, value_name = "HOURS", value_parser = clap::value_parser!(i64).range(1..))]
        window_hours: Option<i64>,
    },
    /// Authorize watchrelay with Trakt or Simkl
    Auth {
        #[command(subcommand)]
        service: AuthCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum AuthCommands {
    /// Device-code authorization with Trakt (reuses or refreshes a saved token)
    Trakt {
        /// Run the device flow even if a valid token is saved
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// PIN authorization with Simkl
    Simkl,
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show current configuration (masks client secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a new config file, prompting for API credentials when interactive
    Init {
        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = config::configured_log_file(cli.config.as_deref());
    logging::init_logging(cli.verbose, cli.quiet, log_file.as_deref())
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = cli.config;

    match cli.command {
        Commands::Sync { dry_run, window_hours } => {
            sync::run_sync(config_path, dry_run, window_hours, &output).await
        }
        Commands::Auth { service } => auth::run_auth(config_path, service, &output).await,
        Commands::Config { cmd } => config::run_config(config_path, cmd, &output).await,
    }
}
