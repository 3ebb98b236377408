//! Gazprep CLI - filter and normalize gazetteer records before indexing
//!
//! This is the main entry point for the gazprep binary, a host that drives
//! the processing stage over JSON Lines input.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // Configuration is read first so its [logging] section can take effect
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, None),
    };

    let log_guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    match run(cli, config).await {
        Ok(()) => {
            drop(log_guard);
            process::exit(0);
        }
        Err(e) => exit_with(&e, log_guard),
    }
}

/// Report an error and exit with its code, flushing file logs first
fn exit_with(e: &error::Error, log_guard: Option<WorkerGuard>) -> ! {
    tracing::error!(error = %e, "Command failed");
    drop(log_guard);

    eprintln!(
        "{}",
        error::format_error(e, control::SHOULD_COLORIZE.should_colorize())
    );
    if e.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }
    process::exit(e.exit_code());
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Process(args) => handlers::handle_process(args, &config, &mut output).await,
        Commands::Check(args) => handlers::handle_check(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_settings(&config.logging, cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
