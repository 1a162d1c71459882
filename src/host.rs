/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::host
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Resolve the host operating-system family used to select a
    package lister.

  Security / Safety Notes:
    Reads /etc/os-release (or an operator-supplied path) only.

  Dependencies:
    None beyond std.

  Operational Scope:
    Called once per run unless the operator forces a family.

  Revision History:
    2025-11-12 COD  Added os-release family detection.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Closed set of recognised families
    - Explicit failure when the host cannot be identified
============================================================*/

use std::fmt;
use std::path::Path;

use crate::error::{Result, ScanError};

const REDHAT_IDS: &[&str] = &[
    "rhel",
    "redhat",
    "centos",
    "fedora",
    "amzn",
    "rocky",
    "almalinux",
    "ol",
    "scientific",
    "cloudlinux",
];
const REDHAT_LIKE: &[&str] = &["rhel", "fedora", "centos"];

const DEBIAN_IDS: &[&str] = &[
    "debian",
    "ubuntu",
    "raspbian",
    "linuxmint",
    "pop",
    "elementary",
    "kali",
    "neon",
];
const DEBIAN_LIKE: &[&str] = &["debian", "ubuntu"];

/// Coarse OS classification that selects a package lister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Family {
    RedHat,
    Debian,
    Darwin,
    Other(String),
}

impl Family {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "redhat" => Family::RedHat,
            "debian" => Family::Debian,
            "darwin" => Family::Darwin,
            other => Family::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Family::RedHat => "redhat",
            Family::Debian => "debian",
            Family::Darwin => "darwin",
            Family::Other(name) => name,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the family of the running host.
pub fn detect_family(os_release: &Path) -> Result<Family> {
    match std::env::consts::OS {
        "macos" => Ok(Family::Darwin),
        "linux" => {
            let contents = std::fs::read_to_string(os_release).map_err(|err| {
                ScanError::Detection(format!(
                    "Failed to read {}: {err}",
                    os_release.display()
                ))
            })?;
            family_from_os_release(&contents)
        }
        other => Ok(Family::Other(other.to_string())),
    }
}

/// Classify the contents of an os-release file.
pub fn family_from_os_release(contents: &str) -> Result<Family> {
    let mut id: Option<String> = None;
    let mut id_like: Vec<String> = Vec::new();

    for line in contents.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            match key.trim() {
                "ID" => id = Some(value.to_ascii_lowercase()),
                "ID_LIKE" => {
                    id_like = value
                        .split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect()
                }
                _ => {}
            }
        }
    }

    let id = id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ScanError::Detection("os-release carries no ID entry".into()))?;

    let like_any = |known: &[&str]| id_like.iter().any(|like| known.contains(&like.as_str()));

    if REDHAT_IDS.contains(&id.as_str()) || like_any(REDHAT_LIKE) {
        Ok(Family::RedHat)
    } else if DEBIAN_IDS.contains(&id.as_str()) || like_any(DEBIAN_LIKE) {
        Ok(Family::Debian)
    } else {
        Ok(Family::Other(id))
    }
}
