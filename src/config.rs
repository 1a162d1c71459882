/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load operator configuration for Syn-Scan-Core: package
    source locations and logging preferences.

  Security / Safety Notes:
    Configuration is read from operator-owned paths only and
    never written back.

  Dependencies:
    serde + toml for parsing, dirs for XDG-style locations.

  Operational Scope:
    Resolved once at start-up; CLI flags override file values.

  Revision History:
    2025-11-12 COD  Introduced layered configuration.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Sensible defaults with explicit overrides
    - Clear diagnostics for malformed configuration
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ScanError};

const APP_DIR: &str = "syn-scan";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}

/// Where each lister finds its data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub rpm_binary: PathBuf,
    pub status_file: PathBuf,
    pub cellar: PathBuf,
    pub os_release: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            rpm_binary: PathBuf::from("/usr/bin/rpm"),
            status_file: PathBuf::from("/var/lib/dpkg/status"),
            cellar: PathBuf::from("/usr/local/Cellar"),
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

impl ScanConfig {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing default file yields built-in defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ScanError::Config(format!(
                        "Configuration file {} does not exist",
                        explicit.display()
                    )));
                }
                Self::load(explicit)
            }
            None => match default_config_path() {
                Some(candidate) if candidate.is_file() => Self::load(&candidate),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            ScanError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|err| ScanError::Config(format!("Failed to parse {}: {err}", path.display())))
    }

    /// Directory receiving session logs.
    pub fn log_dir(&self) -> PathBuf {
        self.logging.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("logs")
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_system_locations() {
        let config = ScanConfig::default();
        assert_eq!(config.sources.rpm_binary, PathBuf::from("/usr/bin/rpm"));
        assert_eq!(
            config.sources.status_file,
            PathBuf::from("/var/lib/dpkg/status")
        );
        assert_eq!(config.sources.cellar, PathBuf::from("/usr/local/Cellar"));
        assert!(config.logging.enabled);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sources]\ncellar = \"/opt/homebrew/Cellar\"").unwrap();
        writeln!(file, "[logging]\nenabled = false").unwrap();

        let config = ScanConfig::load_from_optional_path(Some(file.path())).unwrap();
        assert_eq!(config.sources.cellar, PathBuf::from("/opt/homebrew/Cellar"));
        assert_eq!(config.sources.rpm_binary, PathBuf::from("/usr/bin/rpm"));
        assert!(!config.logging.enabled);
    }

    #[test]
    fn explicit_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScanConfig::load_from_optional_path(Some(&dir.path().join("nope.toml")))
            .unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn malformed_file_names_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sources\ncellar =").unwrap();
        let err = ScanConfig::load_from_optional_path(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn configured_log_dir_wins() {
        let mut config = ScanConfig::default();
        config.logging.directory = Some(PathBuf::from("/tmp/scan-logs"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/scan-logs"));
    }
}
