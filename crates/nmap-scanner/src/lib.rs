#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`NmapScannerError`, `ScanError`, `ScanErrorKind`)
//! - [`config`]: Scanner configuration (`NmapScannerConfig`, builder)
//! - [`types`]: Normalized result model (`ScanRequest`, `ScanResult`, `HostResult`, `PortResult`)
//! - [`invoker`]: Process execution (`NmapInvoker`, `CommandRunner` trait, `ProcessRunner`)
//! - [`normalizer`]: nmap XML to `ScanResult` conversion
//! - [`scanner`]: Main orchestrator (`NmapScanner`, `NmapScannerBuilder`, `run_scan`)
//!
//! # Architecture
//!
//! ```text
//! ScanRequest --> NmapInvoker --> CommandRunner --> nmap -oX -
//!                                                      |
//!                                                   raw XML
//!                                                      |
//!                                                  normalize
//!                                                      |
//!                                       ScanResult | ScanError
//! ```

pub mod config;
pub mod error;
pub mod invoker;
pub mod normalizer;
pub mod scanner;
pub mod types;

// --- Public API Re-exports ---

// Scanner (main orchestrator)
pub use scanner::{NmapScanner, NmapScannerBuilder, run_scan};

// Configuration
pub use config::{NmapScannerConfig, NmapScannerConfigBuilder};

// Error
pub use error::{NmapScannerError, ScanError, ScanErrorKind};

// Types
pub use types::{ABSENT, HostResult, Hostname, PortResult, ScanRequest, ScanResult};

// Invoker
pub use invoker::{CommandRunner, NmapInvoker, ProcessRunner, RawOutput, build_args};

// Normalizer
pub use normalizer::normalize;
