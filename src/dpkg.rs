/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::dpkg
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Read the dpkg status database to enumerate installed
    packages on Debian derived systems.

  Security / Safety Notes:
    Opens the status file read-only; no dpkg binaries are run.

  Dependencies:
    std::io buffered reading only.

  Operational Scope:
    Selected by the dispatcher when the host family is debian.

  Revision History:
    2025-11-12 COD  Authored status file reader.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit parser state with a single flush transition
    - Structured parsing with clear failure modes
    - Scoped file handles released on every path
============================================================*/

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, ScanError};
use crate::logger::Logger;
use crate::package::Package;

/// Classification of a single status file line.
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    /// Empty after trimming; terminates the current block.
    Blank,
    /// Leading whitespace; belongs to a multi-line field and is skipped.
    Continuation,
    Field { key: String, value: &'a str },
}

impl<'a> LineKind<'a> {
    fn classify(line: &'a str) -> Result<Self> {
        if line.trim().is_empty() {
            return Ok(LineKind::Blank);
        }
        if line.starts_with(char::is_whitespace) {
            return Ok(LineKind::Continuation);
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            ScanError::Format(format!("status line `{line}` has no ':' separator"))
        })?;
        Ok(LineKind::Field {
            key: key.to_ascii_lowercase(),
            value: value.trim(),
        })
    }
}

#[derive(Debug)]
enum BlockState {
    Accumulating(Package),
}

/// Incremental parser over status file lines.
#[derive(Debug)]
pub struct StatusParser {
    state: BlockState,
    packages: Vec<Package>,
}

impl Default for StatusParser {
    fn default() -> Self {
        Self {
            state: BlockState::Accumulating(Package::default()),
            packages: Vec::new(),
        }
    }
}

impl StatusParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator).
    pub fn feed(&mut self, line: &str) -> Result<()> {
        let BlockState::Accumulating(current) = &mut self.state;
        match LineKind::classify(line)? {
            LineKind::Blank => {
                let complete = std::mem::take(current);
                self.packages.push(complete);
            }
            LineKind::Continuation => {}
            LineKind::Field { key, value } => apply_field(current, &key, value)?,
        }
        Ok(())
    }

    /// Consume the parser. Returns the completed records and the block that
    /// was still open at end of input, if any lines were fed into it.
    ///
    /// Only blank-terminated blocks count as complete, so the open block is
    /// never part of the returned records.
    pub fn finish(self) -> (Vec<Package>, Option<Package>) {
        let BlockState::Accumulating(current) = self.state;
        let pending = (current != Package::default()).then_some(current);
        (self.packages, pending)
    }
}

fn apply_field(package: &mut Package, key: &str, value: &str) -> Result<()> {
    match key {
        "package" => package.name = value.to_string(),
        "architecture" => package.arch = Some(value.to_string()),
        "version" => package.version = Some(value.to_string()),
        "description" => package.summary = Some(value.to_string()),
        "installed-size" => {
            let size = value.parse::<u64>().map_err(|err| {
                ScanError::Format(format!("invalid Installed-Size `{value}`: {err}"))
            })?;
            package.size = Some(size);
        }
        _ => {}
    }
    Ok(())
}

/// Parse status data from any buffered reader. Bytes that are not valid
/// UTF-8 are replaced rather than rejected.
pub fn parse_status<R: BufRead>(mut reader: R) -> Result<(Vec<Package>, Option<Package>)> {
    let mut parser = StatusParser::new();
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        let raw = buffer.strip_suffix(b"\n").unwrap_or(&buffer[..]);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        parser.feed(&String::from_utf8_lossy(raw))?;
    }
    Ok(parser.finish())
}

/// Enumerate installed packages recorded in the dpkg status file.
pub fn list_packages(status_file: &Path, logger: &Logger) -> Result<Vec<Package>> {
    let file = File::open(status_file).map_err(|err| {
        ScanError::Filesystem(format!(
            "Failed to open status file {}: {err}",
            status_file.display()
        ))
    })?;

    let (packages, pending) = parse_status(BufReader::new(file)).map_err(|err| match err {
        ScanError::Io(io) => ScanError::Filesystem(format!(
            "Failed to read status file {}: {io}",
            status_file.display()
        )),
        other => other,
    })?;

    if let Some(dropped) = pending {
        logger.warn(
            "DPKG",
            format!(
                "Discarding unterminated trailing block `{}` in {}",
                dropped.name,
                status_file.display()
            ),
        );
    }

    Ok(packages)
}
