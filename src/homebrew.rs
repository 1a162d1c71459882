/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::homebrew
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Walk the Homebrew Cellar to enumerate installed formulae and
    their versions on Darwin hosts.

  Security / Safety Notes:
    Reads directory listings and small formula files only; the
    formula Ruby source is never evaluated.

  Dependencies:
    std::fs for directory traversal, chrono for timestamps.

  Operational Scope:
    Selected by the dispatcher when the host family is darwin.

  Revision History:
    2025-11-12 COD  Authored Cellar walker.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible output
    - Bounded metadata scan per formula
    - A missing formula file is the only tolerated absence
============================================================*/

use std::fs::{self, DirEntry, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Result, ScanError};
use crate::logger::Logger;
use crate::package::Package;

/// Number of formula lines inspected for `desc` and `homepage`.
pub const FORMULA_SCAN_LINES: usize = 15;

const DESC_MARKER: &str = "  desc ";
const HOMEPAGE_MARKER: &str = "  homepage ";

/// Enumerate every (formula, version) pair below the Cellar.
pub fn list_packages(cellar: &Path, logger: &Logger) -> Result<Vec<Package>> {
    let metadata = fs::metadata(cellar).map_err(|err| {
        ScanError::Filesystem(format!(
            "Homebrew cellar not found at {}: {err}",
            cellar.display()
        ))
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::Filesystem(format!(
            "{} is not a directory",
            cellar.display()
        )));
    }

    let mut packages = Vec::new();
    for formula_dir in sorted_subdirectories(cellar)? {
        let name = formula_dir.file_name().to_string_lossy().into_owned();
        for version_dir in sorted_subdirectories(&formula_dir.path())? {
            let version_path = version_dir.path();
            let modified = version_dir
                .metadata()
                .and_then(|meta| meta.modified())
                .map_err(|err| {
                    ScanError::Filesystem(format!(
                        "Failed to read modification time of {}: {err}",
                        version_path.display()
                    ))
                })?;

            let mut package = Package::named(name.clone());
            package.version = Some(version_dir.file_name().to_string_lossy().into_owned());
            package.install_time = Some(DateTime::<Utc>::from(modified));

            if !enrich_from_formula(&mut package, &version_path)? {
                logger.debug(
                    "BREW",
                    format!("No formula metadata for {} {}", name, version_path.display()),
                );
            }
            packages.push(package);
        }
    }

    Ok(packages)
}

/// Location of the formula file Homebrew keeps inside a version directory.
pub fn formula_path(version_dir: &Path, name: &str) -> PathBuf {
    version_dir.join(".brew").join(format!("{name}.rb"))
}

/// Fill `summary` and `url` from the formula file. Returns `false` when the
/// file does not exist.
fn enrich_from_formula(package: &mut Package, version_dir: &Path) -> Result<bool> {
    let path = formula_path(version_dir, &package.name);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(ScanError::Filesystem(format!(
                "Failed to open formula {}: {err}",
                path.display()
            )))
        }
    };

    for line in BufReader::new(file).lines().take(FORMULA_SCAN_LINES) {
        let line = line.map_err(|err| {
            ScanError::Filesystem(format!("Failed to read formula {}: {err}", path.display()))
        })?;
        if let Some(rest) = line.strip_prefix(DESC_MARKER) {
            package.summary = Some(unquote(rest));
        } else if let Some(rest) = line.strip_prefix(HOMEPAGE_MARKER) {
            package.url = Some(unquote(rest));
        }
    }
    Ok(true)
}

fn unquote(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

fn sorted_subdirectories(dir: &Path) -> Result<Vec<DirEntry>> {
    let read_error = |err: io::Error| {
        ScanError::Filesystem(format!("Error reading directory {}: {err}", dir.display()))
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if entry.file_type().map_err(read_error)?.is_dir() {
            entries.push(entry);
        }
    }
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}
