/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::rpm
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Interface with the rpm utility to enumerate installed
    packages on Red Hat derived systems.

  Security / Safety Notes:
    Executes the rpm binary read-only with user privileges;
    no privilege escalation is attempted.

  Dependencies:
    tokio::process for command execution, chrono for install
    timestamps.

  Operational Scope:
    Selected by the dispatcher when the host family is redhat.

  Revision History:
    2025-11-12 COD  Crafted rpm integration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Structured parsing with clear failure modes
    - No partial results on malformed output
============================================================*/

use std::io;
use std::path::Path;
use std::process::Stdio;

use chrono::{TimeZone, Utc};
use tokio::process::Command;

use crate::error::{Result, ScanError};
use crate::package::Package;

/// Query template handed to `rpm --qf`; one pipe-delimited record per line.
pub const QUERY_FORMAT: &str =
    "%{NAME}|%{VERSION}|%{RELEASE}|%{ARCH}|%{LICENSE}|%{INSTALLTIME}|%{SIZE}|%{SUMMARY}\\n";

const FIELD_COUNT: usize = 8;

/// Enumerate all installed packages via `rpm --qf <template> -qa`.
pub async fn list_packages(rpm_binary: &Path) -> Result<Vec<Package>> {
    let command = rpm_binary.display().to_string();
    let output = Command::new(rpm_binary)
        .arg("--qf")
        .arg(QUERY_FORMAT)
        .arg("-qa")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| map_spawn_error(err, &command))?;

    if !output.status.success() {
        return Err(ScanError::CommandFailure {
            command: format!("{command} -qa"),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    // Older databases carry Latin-1 summaries; replace rather than reject.
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_query_output(&stdout)
}

/// Parse the output of [`QUERY_FORMAT`]. Blank lines are skipped; any
/// malformed line aborts the whole parse.
pub fn parse_query_output(stdout: &str) -> Result<Vec<Package>> {
    let mut packages = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        packages.push(parse_query_line(line)?);
    }
    Ok(packages)
}

fn parse_query_line(line: &str) -> Result<Package> {
    // The summary is last and may itself contain the delimiter.
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, '|').collect();
    if fields.len() < FIELD_COUNT {
        return Err(ScanError::Format(format!(
            "malformed line `{line}`: expected {FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }

    let epoch = fields[5].parse::<i64>().map_err(|err| {
        ScanError::Format(format!("invalid install time `{}`: {err}", fields[5]))
    })?;
    let install_time = Utc.timestamp_opt(epoch, 0).single().ok_or_else(|| {
        ScanError::Format(format!("install time `{epoch}` is out of range"))
    })?;
    let size = fields[6]
        .parse::<u64>()
        .map_err(|err| ScanError::Format(format!("invalid size `{}`: {err}", fields[6])))?;

    Ok(Package {
        name: fields[0].to_string(),
        version: Some(fields[1].to_string()),
        release: Some(fields[2].to_string()),
        arch: Some(fields[3].to_string()),
        license: Some(fields[4].to_string()),
        install_time: Some(install_time),
        size: Some(size),
        summary: Some(fields[7].to_string()),
        url: None,
    })
}

fn map_spawn_error(err: io::Error, command: &str) -> ScanError {
    if err.kind() == io::ErrorKind::NotFound {
        ScanError::CommandMissing {
            command: command.into(),
        }
    } else {
        ScanError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
bash|5.2.26|1.fc40|x86_64|GPL-3.0-or-later|1712345678|8281014|The GNU Bourne Again shell

gpg-pubkey|8c5ba4f9|5e2f8a4c|(none)|pubkey|1700000000|0|Fedora (40) <fedora-40-primary@fedoraproject.org>
";

    #[test]
    fn maps_fields_positionally() {
        let packages = parse_query_output(SAMPLE).unwrap();
        assert_eq!(packages.len(), 2);

        let bash = &packages[0];
        assert_eq!(bash.name, "bash");
        assert_eq!(bash.version.as_deref(), Some("5.2.26"));
        assert_eq!(bash.release.as_deref(), Some("1.fc40"));
        assert_eq!(bash.arch.as_deref(), Some("x86_64"));
        assert_eq!(bash.license.as_deref(), Some("GPL-3.0-or-later"));
        assert_eq!(bash.install_time.unwrap().timestamp(), 1_712_345_678);
        assert_eq!(bash.size, Some(8_281_014));
        assert_eq!(bash.summary.as_deref(), Some("The GNU Bourne Again shell"));
        assert!(bash.url.is_none());

        assert_eq!(packages[1].arch.as_deref(), Some("(none)"));
        assert_eq!(packages[1].size, Some(0));
    }

    #[test]
    fn summary_keeps_embedded_delimiters() {
        let packages = parse_query_output("a|1|1|noarch|MIT|0|1|left | right\n").unwrap();
        assert_eq!(packages[0].summary.as_deref(), Some("left | right"));
    }

    #[test]
    fn short_line_is_fatal() {
        let input = format!("{SAMPLE}broken|1.0|1|x86_64\n");
        let err = parse_query_output(&input).unwrap_err();
        assert!(matches!(err, ScanError::Format(_)));
        assert!(err.to_string().contains("broken|1.0|1|x86_64"));
    }

    #[test]
    fn non_numeric_install_time_is_fatal() {
        let err = parse_query_output("a|1|1|noarch|MIT|yesterday|1|x\n").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn negative_size_is_fatal() {
        let err = parse_query_output("a|1|1|noarch|MIT|0|-5|x\n").unwrap_err();
        assert!(matches!(err, ScanError::Format(_)));
    }

    #[test]
    fn empty_output_yields_no_packages() {
        assert!(parse_query_output("\n  \n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let err = list_packages(Path::new("/nonexistent/bin/rpm"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::CommandMissing { .. }));
    }

    #[cfg(unix)]
    fn write_stub(dir: &Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("rpm");
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    async fn run_stub(stub: &Path) -> Result<Vec<Package>> {
        // A concurrently forked test process can briefly hold the fresh
        // script open for writing (ETXTBSY); retry the spawn in that case.
        let mut attempts = 0;
        loop {
            match list_packages(stub).await {
                Err(ScanError::Runtime(_)) if attempts < 5 => {
                    attempts += 1;
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
                other => return other,
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stub_binary_output_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "[ \"$1\" = \"--qf\" ] || exit 3\n\
             [ \"$2\" = '{QUERY_FORMAT}' ] || exit 4\n\
             [ \"$3\" = \"-qa\" ] || exit 5\n\
             printf '%s\\n' \
             'bash|5.2.26|1.fc40|x86_64|GPL-3.0-or-later|1712345678|8281014|The GNU Bourne Again shell' \
             'zlib|1.3|2.el9|aarch64|zlib|1700000000|204800|Compression library'\n"
        );
        let stub = write_stub(dir.path(), &body);

        let packages = run_stub(&stub).await.unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "bash");
        assert_eq!(packages[0].release.as_deref(), Some("1.fc40"));
        assert_eq!(packages[0].install_time.unwrap().timestamp(), 1_712_345_678);
        assert_eq!(packages[1].name, "zlib");
        assert_eq!(packages[1].arch.as_deref(), Some("aarch64"));
        assert_eq!(packages[1].size, Some(204_800));
        assert_eq!(packages[1].summary.as_deref(), Some("Compression library"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn latin1_summary_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(dir.path(), "printf 'a|1|1|noarch|MIT|0|1|caf\\351\\n'\n");

        let packages = run_stub(&stub).await.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].summary.as_deref(), Some("caf\u{FFFD}"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_binary_is_reported() {
        let err = list_packages(Path::new("false")).await.unwrap_err();
        match err {
            ScanError::CommandFailure { status, .. } => assert_ne!(status, 0),
            other => panic!("unexpected error: {other}"),
        }
    }
}
