/*============================================================
  Synavera Project: Syn-Scan
  Module: synscan_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-Scan Core. Detects the host package
    family, enumerates installed packages with the matching
    lister, and emits one JSON record per line.

  Security / Safety Notes:
    Operates within user privileges. Executes rpm and reads
    package databases read-only.

  Dependencies:
    clap for CLI parsing, chrono for timestamps, serde_json for
    record output.

  Operational Scope:
    Invoked directly by operators or inventory collectors that
    consume the JSON lines on stdout.

  Revision History:
    2025-11-12 COD  Authored Syn-Scan Core runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod dpkg;
mod error;
mod homebrew;
mod host;
mod lister;
mod logger;
mod package;
mod rpm;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::ScanConfig;
use error::{Result, ScanError};
use host::Family;
use lister::Lister;
use logger::{session_file_name, LogLevel, Logger};
use package::Package;

/// Command-line arguments for Syn-Scan-Core.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Scan-Core",
    version,
    author = "Synavera Systems",
    about = "Installed package inventory for Syn-Scan"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH", conflicts_with = "no_log")]
    log: Option<PathBuf>,
    /// Do not write a session log file.
    #[arg(long, action = ArgAction::SetTrue)]
    no_log: bool,
    /// Skip host detection and use this OS family (redhat, debian, darwin).
    #[arg(long, value_name = "FAMILY")]
    family: Option<String>,
    /// Override the rpm binary.
    #[arg(long, value_name = "PATH")]
    rpm: Option<PathBuf>,
    /// Override the dpkg status file.
    #[arg(long, value_name = "PATH")]
    status_file: Option<PathBuf>,
    /// Override the Homebrew Cellar directory.
    #[arg(long, value_name = "PATH")]
    cellar: Option<PathBuf>,
    /// Write records to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Scan-Core] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            err.print()?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(ScanError::Usage(err.render().to_string())),
    };

    let mut config = ScanConfig::load_from_optional_path(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    let log_path = if cli.no_log || (!config.logging.enabled && cli.log.is_none()) {
        None
    } else {
        cli.log
            .clone()
            .or_else(|| Some(config.log_dir().join(session_file_name(Utc::now()))))
    };
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.info("INIT", "Syn-Scan Core awakening.");

    let packages = match collect(&cli, &config, &logger).await {
        Ok(packages) => packages,
        Err(err) => {
            logger.record(
                LogLevel::Error,
                "FATAL",
                format!("{} failure: {err}", err.category()),
            );
            if let Err(hash_err) = logger.finalize() {
                eprintln!("[Syn-Scan-Core] {hash_err}");
            }
            return Err(err);
        }
    };

    emit(&packages, cli.output.as_deref())?;
    logger.info("EMIT", format!("Emitted {} records", packages.len()));
    logger.info("COMPLETE", "Inventory complete.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}

fn apply_overrides(config: &mut ScanConfig, cli: &Cli) {
    if let Some(rpm) = &cli.rpm {
        config.sources.rpm_binary = rpm.clone();
    }
    if let Some(status_file) = &cli.status_file {
        config.sources.status_file = status_file.clone();
    }
    if let Some(cellar) = &cli.cellar {
        config.sources.cellar = cellar.clone();
    }
}

async fn collect(cli: &Cli, config: &ScanConfig, logger: &Logger) -> Result<Vec<Package>> {
    let family = match &cli.family {
        Some(name) => Family::from_name(name),
        None => host::detect_family(&config.sources.os_release)?,
    };
    logger.info("FAMILY", format!("Host family resolved to {family}"));

    let lister = Lister::for_family(&family)?;
    logger.info("LISTER", format!("Using {lister} lister"));

    let packages = lister.list(&config.sources, logger).await?;
    logger.info(
        "SUMMARY",
        format!("{lister} lister found {} packages", packages.len()),
    );
    Ok(packages)
}

/// Serialize every record, one compact JSON object per line.
fn emit(packages: &[Package], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|err| {
                    ScanError::Filesystem(format!(
                        "Failed to create output directory {}: {err}",
                        parent.display()
                    ))
                })?;
            }
            let file = File::create(path).map_err(|err| {
                ScanError::Filesystem(format!(
                    "Failed to create output file {}: {err}",
                    path.display()
                ))
            })?;
            write_records(BufWriter::new(file), packages)
        }
        None => write_records(BufWriter::new(io::stdout().lock()), packages),
    }
}

fn write_records<W: Write>(mut writer: W, packages: &[Package]) -> Result<()> {
    for package in packages {
        let line = serde_json::to_string(package).map_err(|err| {
            ScanError::Serialization(format!("Failed to encode {}: {err}", package.name))
        })?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_one_object_per_line() {
        let packages = vec![Package::named("a"), Package::named("b")];
        let mut buffer = Vec::new();
        write_records(&mut buffer, &packages).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["Name"], "a");
    }

    #[test]
    fn cli_overrides_replace_sources() {
        let cli = Cli::parse_from([
            "syn-scan-core",
            "--cellar",
            "/opt/homebrew/Cellar",
            "--status-file",
            "/tmp/status",
        ]);
        let mut config = ScanConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(
            config.sources.cellar,
            PathBuf::from("/opt/homebrew/Cellar")
        );
        assert_eq!(config.sources.status_file, PathBuf::from("/tmp/status"));
        assert_eq!(config.sources.rpm_binary, PathBuf::from("/usr/bin/rpm"));
    }
}
