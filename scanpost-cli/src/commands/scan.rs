//! `scanpost scan` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use scanpost_core::config::ScanpostConfig;
use scanpost_nmap::{ABSENT, HostResult, NmapScannerBuilder, NmapScannerConfig, PortResult, ScanError, ScanResult};

use crate::cli::{OutputFormat, ScanArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// A missing config file is not an error here; defaults (plus env overrides) apply.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = ScanpostConfig::load_or_default(config_path).await?;

    let scanner = NmapScannerBuilder::new()
        .config(NmapScannerConfig::from_core(&config.nmap))
        .build()?;

    let options = scanner.config().effective_options(&args.options).to_owned();
    info!(host = %args.host, options = %options, "starting nmap scan");

    // nmap runs as a blocking child process
    let host = args.host.clone();
    let effective = options.clone();
    let outcome = tokio::task::spawn_blocking(move || scanner.run(&host, &effective))
        .await
        .map_err(|e| CliError::Command(format!("scan task failed: {e}")))?;

    match outcome {
        Ok(result) => {
            let report = ScanReport {
                target: args.host,
                options,
                result,
            };
            writer.render(&report)?;
            Ok(())
        }
        Err(e) => {
            if writer.format() == OutputFormat::Json {
                writer.render(&ScanFailureReport(e.clone()))?;
            }
            Err(e.into())
        }
    }
}

/// Successful scan output.
///
/// Serializes as the bare `ScanResult`; the target and options only appear in text output.
#[derive(Serialize)]
#[serde(transparent)]
pub struct ScanReport {
    /// Requested target
    #[serde(skip)]
    pub target: String,
    /// Options actually passed to nmap (configured defaults when none were given)
    #[serde(skip)]
    pub options: String,
    /// Normalized result
    pub result: ScanResult,
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Running Nmap scan on {} with options: {}",
            self.target.bold(),
            self.options
        )?;
        writeln!(w, "Scan Results:")?;

        for host in &self.result.hosts {
            render_host(w, host)?;
        }

        Ok(())
    }
}

fn render_host(w: &mut dyn Write, host: &HostResult) -> std::io::Result<()> {
    use colored::Colorize;

    let address = host.primary_address().unwrap_or(ABSENT);
    writeln!(w, "  Host: {}", address.bold())?;

    let status = host.status.as_deref().unwrap_or(ABSENT);
    let status = if host.is_up() {
        status.green()
    } else {
        status.yellow()
    };
    writeln!(w, "    Status: {status}")?;

    if !host.hostnames.is_empty() {
        let names: Vec<&str> = host
            .hostnames
            .iter()
            .map(|h| h.name.as_deref().unwrap_or(ABSENT))
            .collect();
        writeln!(w, "    Hostnames: {}", names.join(", "))?;
    }

    writeln!(w, "    Ports:")?;
    for port in &host.ports {
        writeln!(w, "      - {}", port_line(port))?;
    }

    Ok(())
}

/// `"Port 22/tcp: open (Service: ssh OpenSSH 8.2p1)"`
fn port_line(port: &PortResult) -> String {
    let mut line = format!(
        "Port {}/{}: {}",
        port.portid.as_deref().unwrap_or(ABSENT),
        port.protocol.as_deref().unwrap_or(ABSENT),
        port.state.as_deref().unwrap_or(ABSENT)
    );
    if let Some(summary) = port.service_summary() {
        line.push_str(&format!(" (Service: {summary})"));
    }
    line
}

/// Failed scan output (JSON mode only).
#[derive(Serialize)]
#[serde(transparent)]
pub struct ScanFailureReport(pub ScanError);

impl Render for ScanFailureReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Error: {}", self.0)
    }
}
