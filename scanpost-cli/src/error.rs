//! CLI-specific error types and exit code mapping

use scanpost_core::error::ScanpostError;
use scanpost_nmap::ScanError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from scanpost-core.
    #[error("{0}")]
    Core(#[from] ScanpostError),

    /// The nmap scan failed.
    #[error("scan error: {0}")]
    Scan(String),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                 |
    /// |------|-------------------------|
    /// | 0    | Success                 |
    /// | 1    | General / command error |
    /// | 2    | Configuration error     |
    /// | 4    | Scan failed             |
    /// | 10   | IO error                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(ScanpostError::Config(_)) => 2,
            Self::Scan(_) | Self::Core(ScanpostError::Scan(_)) => 4,
            Self::Io(_) | Self::Core(ScanpostError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ScanError> for CliError {
    fn from(e: ScanError) -> Self {
        Self::Scan(e.message)
    }
}

impl From<scanpost_nmap::NmapScannerError> for CliError {
    fn from(e: scanpost_nmap::NmapScannerError) -> Self {
        match e {
            scanpost_nmap::NmapScannerError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Scan(other.to_string()),
        }
    }
}
