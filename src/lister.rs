/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::lister
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Map a host family onto exactly one package lister and run
    it against the configured sources.

  Security / Safety Notes:
    Delegates to read-only listers; performs no I/O itself.

  Dependencies:
    None beyond crate modules.

  Operational Scope:
    Invoked once per run by the entry point.

  Revision History:
    2025-11-12 COD  Added family dispatch.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Closed dispatch over known package managers
    - Unsupported platforms fail loudly
============================================================*/

use std::fmt;

use crate::config::SourcesConfig;
use crate::dpkg;
use crate::error::{Result, ScanError};
use crate::homebrew;
use crate::host::Family;
use crate::logger::Logger;
use crate::package::Package;
use crate::rpm;

/// Package-manager strategy selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lister {
    Rpm,
    Dpkg,
    Homebrew,
}

impl Lister {
    pub fn for_family(family: &Family) -> Result<Self> {
        match family {
            Family::RedHat => Ok(Lister::Rpm),
            Family::Debian => Ok(Lister::Dpkg),
            Family::Darwin => Ok(Lister::Homebrew),
            Family::Other(name) => Err(ScanError::UnsupportedPlatform {
                family: name.clone(),
            }),
        }
    }

    /// Run this lister to completion. Any failure discards all records.
    pub async fn list(self, sources: &SourcesConfig, logger: &Logger) -> Result<Vec<Package>> {
        match self {
            Lister::Rpm => {
                logger.debug(
                    "RPM",
                    format!("Querying {}", sources.rpm_binary.display()),
                );
                rpm::list_packages(&sources.rpm_binary).await
            }
            Lister::Dpkg => {
                logger.debug(
                    "DPKG",
                    format!("Reading {}", sources.status_file.display()),
                );
                dpkg::list_packages(&sources.status_file, logger)
            }
            Lister::Homebrew => {
                logger.debug("BREW", format!("Walking {}", sources.cellar.display()));
                homebrew::list_packages(&sources.cellar, logger)
            }
        }
    }
}

impl fmt::Display for Lister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lister::Rpm => "rpm",
            Lister::Dpkg => "dpkg",
            Lister::Homebrew => "homebrew",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn known_families_select_their_lister() {
        assert_eq!(Lister::for_family(&Family::RedHat).unwrap(), Lister::Rpm);
        assert_eq!(Lister::for_family(&Family::Debian).unwrap(), Lister::Dpkg);
        assert_eq!(
            Lister::for_family(&Family::Darwin).unwrap(),
            Lister::Homebrew
        );
    }

    #[test]
    fn other_family_is_unsupported() {
        let err = Lister::for_family(&Family::from_name("windows")).unwrap_err();
        match err {
            ScanError::UnsupportedPlatform { family } => assert_eq!(family, "windows"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn homebrew_lister_reads_configured_cellar() {
        let cellar = tempfile::tempdir().unwrap();
        fs::create_dir_all(cellar.path().join("jq/1.7.1")).unwrap();
        let sources = SourcesConfig {
            cellar: cellar.path().to_path_buf(),
            ..SourcesConfig::default()
        };
        let logger = Logger::new(None, false).unwrap();

        let packages = Lister::Homebrew.list(&sources, &logger).await.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "jq");
    }

    #[tokio::test]
    async fn dpkg_lister_reads_configured_status_file() {
        let dir = tempfile::tempdir().unwrap();
        let status = dir.path().join("status");
        fs::write(&status, "Package: zlib1g\nVersion: 1:1.3\n\n").unwrap();
        let sources = SourcesConfig {
            status_file: status,
            ..SourcesConfig::default()
        };
        let logger = Logger::new(None, false).unwrap();

        let packages = Lister::Dpkg.list(&sources, &logger).await.unwrap();
        assert_eq!(packages[0].version.as_deref(), Some("1:1.3"));
    }
}
