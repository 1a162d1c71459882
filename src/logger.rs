/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging for Syn-Scan-Core
    sessions. Package records never pass through the logger;
    stdout stays reserved for them.

  Security / Safety Notes:
    Log entries carry paths and counts only, never package
    database contents beyond a package name.

  Dependencies:
    std::sync::Mutex, chrono for timestamps, sha2 for the
    session digest.

  Operational Scope:
    Shared by the dispatcher and listers for diagnostics.

  Revision History:
    2025-11-12 COD  Established logging module for Syn-Scan-Core.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Result, ScanError};

/// Structured log level for Syn-Scan-Core events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn always_echoed(self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

/// Render one entry in Synavera format.
pub fn format_entry(timestamp: DateTime<Utc>, level: LogLevel, code: &str, message: &str) -> String {
    format!(
        "{} [{}] [{}] {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        level.as_str(),
        code,
        message
    )
}

/// Session log file name for the given start time.
pub fn session_file_name(started: DateTime<Utc>) -> String {
    format!("scan_{}.log", started.format("%Y-%m-%d_%H-%M-%S"))
}

/// Shared logger that emits to stderr and optionally to a session file.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
}

impl Logger {
    /// Build a logger that writes to stderr and optionally to a file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let file = match path.as_deref() {
            Some(file_path) => {
                if let Some(parent) = file_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        ScanError::Filesystem(format!(
                            "Failed to create log directory {}: {err}",
                            parent.display()
                        ))
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(file_path)
                    .map_err(|err| {
                        ScanError::Filesystem(format!(
                            "Failed to open log file {}: {err}",
                            file_path.display()
                        ))
                    })?;
                Some(Mutex::new(BufWriter::new(file)))
            }
            None => None,
        };

        Ok(Self {
            file,
            path,
            verbose,
        })
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let payload = format_entry(Utc::now(), level, code, message.as_ref());

        if self.verbose || level.always_echoed() {
            eprintln!("{payload}");
        }
        self.append(&payload);
    }

    /// Record an entry in the session file only. Used for failures the
    /// entry point already reports on stderr.
    pub fn record<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        self.append(&format_entry(Utc::now(), level, code, message.as_ref()));
    }

    fn append(&self, payload: &str) {
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                if writeln!(guard, "{payload}").and_then(|_| guard.flush()).is_err() {
                    eprintln!(
                        "{}",
                        format_entry(
                            Utc::now(),
                            LogLevel::Error,
                            "LOGGER",
                            "Failed to write to log file"
                        )
                    );
                }
            }
        }
    }

    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compute and persist the SHA-256 digest of the session log as
    /// `<log>.hash`.
    pub fn finalize(&self) -> Result<()> {
        let Some(path) = self.path() else {
            return Ok(());
        };

        let data = std::fs::read(path).map_err(|err| {
            ScanError::Filesystem(format!(
                "Failed to read log for hashing {}: {err}",
                path.display()
            ))
        })?;
        let digest = Sha256::digest(&data);

        let mut hash_os = path.as_os_str().to_os_string();
        hash_os.push(".hash");
        let hash_path = PathBuf::from(hash_os);
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        std::fs::write(&hash_path, format!("{digest:x}  {file_name}\n")).map_err(|err| {
            ScanError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })
    }
}
