/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::package
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared record describing one installed package as reported
    by any of the supported package-manager families.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for serialization, chrono for install timestamps.

  Operational Scope:
    Built by the listers and serialized once per line by the
    runtime entry point.

  Revision History:
    2025-11-12 COD  Introduced shared Package record.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Serializable structures with stable field names
============================================================*/

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One installed software unit.
///
/// Fields a package-manager family cannot supply stay `None`, which keeps
/// "not applicable" apart from "reported as empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    pub name: String,
    pub version: Option<String>,
    pub release: Option<String>,
    pub arch: Option<String>,
    pub license: Option<String>,
    pub install_time: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub summary: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
}

impl Package {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
