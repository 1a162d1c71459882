/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Scan-Core error types so every lister reports
    failures with the same diagnostics and exit semantics.

  Security / Safety Notes:
    Error contexts name the failing path, line, or value only;
    no file contents beyond the offending line are echoed.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate fatal failures and to
    resolve the binary's exit code.

  Revision History:
    2025-11-12 COD  Established shared error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Scan-Core operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Exit status reported for every fatal error.
pub const FATAL_EXIT_STATUS: u8 = 1;

/// Enumerates high-level error domains surfaced by Syn-Scan-Core.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Host detection: {0}")]
    Detection(String),
    #[error("Unsupported platform: no package lister for OS family `{family}`")]
    UnsupportedPlatform { family: String },
    #[error("Required command `{command}` not found")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Format: {0}")]
    Format(String),
    #[error("{0}")]
    Usage(String),
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ScanError {
    /// Raw exit status for this error. Every category is fatal.
    pub fn exit_status(&self) -> u8 {
        FATAL_EXIT_STATUS
    }

    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Short label used when logging the failure.
    pub fn category(&self) -> &'static str {
        match self {
            ScanError::Detection(_) => "detection",
            ScanError::UnsupportedPlatform { .. } => "platform",
            ScanError::CommandMissing { .. }
            | ScanError::CommandFailure { .. }
            | ScanError::Runtime(_) => "command",
            ScanError::Format(_) => "format",
            ScanError::Usage(_) => "usage",
            ScanError::Config(_) => "config",
            ScanError::Serialization(_) => "serialization",
            ScanError::Filesystem(_) | ScanError::Io(_) => "io",
        }
    }
}
