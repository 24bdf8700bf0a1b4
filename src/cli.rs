//! Command-line interface definitions for spark-audit.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Security analysis for Microsoft Fabric Spark session logs.
///
/// spark-audit reads a consolidated session-log bundle (Livy, stdout and
/// stderr streams per notebook session), detects network connections,
/// package installs and logging-configuration changes, classifies every
/// endpoint against a trusted-domain catalog, and renders a per-session
/// security report.
#[derive(Parser, Debug)]
#[command(name = "spark-audit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Consolidated log bundle to analyze.
    ///
    /// When omitted, the newest `consolidated_spark_logs_*.json` file is
    /// picked up from `output/` or the current directory.
    pub bundle_file: Option<PathBuf>,

    /// Only include sessions with external activity in the report detail.
    ///
    /// Summary counters are still computed over all sessions.
    #[arg(long = "external-only")]
    pub external_only: bool,

    /// Write the full report as pretty-printed JSON to PATH.
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Write the human-readable summary to PATH.
    #[arg(long = "export-summary", value_name = "PATH")]
    pub export_summary: Option<PathBuf>,

    /// Add a trusted domain pattern for this run (repeatable).
    ///
    /// Accepts exact hosts (`api.example.com`) or wildcard patterns
    /// (`*.example.com`). Not persisted to the config file.
    #[arg(short = 'd', long = "add-trusted-domain", value_name = "PATTERN")]
    pub add_trusted_domains: Vec<String>,

    /// Print the effective trusted-domain catalog and exit.
    #[arg(long = "list-trusted-domains")]
    pub list_trusted_domains: bool,

    /// Path to additional config file.
    ///
    /// This config file is merged on top of the embedded defaults and the
    /// user config, giving it the highest priority (except for CLI flags).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of sessions processed concurrently.
    ///
    /// Defaults to the configured value, or the CPU count capped at 8.
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Only analyze sessions from this workspace (UUID).
    #[arg(long = "workspace-id", value_name = "UUID")]
    pub workspace_id: Option<String>,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["spark-audit"]);
        assert!(cli.bundle_file.is_none());
        assert!(!cli.external_only);
        assert!(cli.export_json.is_none());
        assert!(cli.add_trusted_domains.is_empty());
        assert!(!cli.list_trusted_domains);
        assert!(cli.workers.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_bundle_file() {
        let cli = Cli::parse_from(["spark-audit", "output/consolidated_spark_logs_x.json"]);
        assert_eq!(
            cli.bundle_file,
            Some(PathBuf::from("output/consolidated_spark_logs_x.json"))
        );
    }

    #[test]
    fn test_cli_parse_with_options() {
        let cli = Cli::parse_from([
            "spark-audit",
            "--external-only",
            "--export-json",
            "report.json",
            "-d",
            "partner.corp",
            "-d",
            "*.partner.corp",
            "--workers",
            "4",
            "-vv",
            "bundle.json",
        ]);

        assert!(cli.external_only);
        assert_eq!(cli.export_json, Some(PathBuf::from("report.json")));
        assert_eq!(cli.add_trusted_domains, vec!["partner.corp", "*.partner.corp"]);
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.bundle_file, Some(PathBuf::from("bundle.json")));
    }

    #[test]
    fn test_cli_parse_workspace_filter() {
        let cli = Cli::parse_from([
            "spark-audit",
            "--workspace-id",
            "dfeef225-5614-4404-b47a-3fbaecefac22",
        ]);
        assert_eq!(
            cli.workspace_id.as_deref(),
            Some("dfeef225-5614-4404-b47a-3fbaecefac22")
        );
    }
}
