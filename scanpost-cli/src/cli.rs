//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// scanpost -- run nmap once and print a normalized result.
///
/// Use `scanpost <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scanpost", version, about, long_about = None)]
pub struct Cli {
    /// Path to the scanpost.toml configuration file.
    #[arg(short, long, default_value = "scanpost.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a one-shot nmap scan against a single target.
    Scan(ScanArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Run nmap once and print the normalized result.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Target host name or IP address.
    pub host: String,

    /// Raw nmap options, split on whitespace (e.g. "-sV -T4").
    /// Falls back to `nmap.default_options` when empty.
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub options: String,
}

// ---- config ----

/// Manage scanpost configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, nmap).
        #[arg(long)]
        section: Option<String>,
    },
}
