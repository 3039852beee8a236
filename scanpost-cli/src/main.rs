//! scanpost -- run nmap once and print a normalized result.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;

use scanpost_core::config::ScanpostConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // config errors are reported again by the command itself
    let mut general = ScanpostConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    if let Some(level) = cli.log_level.as_ref() {
        general.log_level = level.clone();
    }

    logging::init_tracing(&general).map_err(|e| CliError::Command(e.to_string()))?;
    scanpost_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "scanpost-cli starting");

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
