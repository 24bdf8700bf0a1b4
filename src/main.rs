//! spark-audit: security analysis for Fabric Spark session logs.
//!
//! This is the main entry point for the spark-audit binary. It handles CLI
//! argument parsing, configuration loading, trust-catalog construction, and
//! runs the analysis pipeline over a consolidated log bundle.
//!
//! All diagnostic logging goes to stderr; stdout carries only the rendered
//! report, so the output stays pipeable.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use spark_audit::{
    bundle::{self, LogBundle},
    catalog::TrustCatalog,
    cli::Cli,
    config::ConfigLoader,
    pipeline::{self, PipelineOptions},
    report,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    debug!("parsed CLI arguments: {:?}", cli);

    // Load configuration with hierarchy merging.
    let config_loader = ConfigLoader::new();
    let config = config_loader
        .load(&cli)
        .context("failed to load configuration")?;

    debug!("loaded configuration: {:?}", config);

    let catalog = TrustCatalog::load(&config.catalog.trusted_domains)
        .context("failed to build trust catalog")?;

    if cli.list_trusted_domains {
        let mut patterns: Vec<&str> = catalog
            .patterns()
            .iter()
            .map(|p| p.pattern.as_str())
            .collect();
        patterns.sort_unstable();
        patterns.dedup();
        for pattern in patterns {
            println!("{pattern}");
        }
        return Ok(());
    }

    // Locate and load the bundle file.
    let bundle_path = match cli.bundle_file.clone() {
        Some(path) => path,
        None => bundle::find_latest_consolidated().context(
            "no bundle file given and no consolidated_spark_logs_*.json found \
             in ./output or the current directory",
        )?,
    };
    info!("analyzing bundle file {:?}", bundle_path);

    let mut bundles = bundle::load_consolidated(&bundle_path)
        .with_context(|| format!("failed to load bundle file {}", bundle_path.display()))?;

    if let Some(ref workspace_id) = cli.workspace_id {
        bundles = filter_workspace(bundles, workspace_id)?;
    }

    let workers = cli
        .workers
        .or_else(|| {
            if config.analysis.workers > 0 {
                Some(config.analysis.workers)
            } else {
                None
            }
        })
        .unwrap_or_else(pipeline::default_workers);

    let options = PipelineOptions {
        external_only: cli.external_only,
        workers,
    };

    let report = pipeline::run_pipeline(bundles, catalog, &options)
        .context("analysis pipeline failed")?;

    report::print_summary(&report);

    if let Some(ref path) = cli.export_json {
        let json = report::to_json(&report).context("failed to serialize report to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write JSON report to {}", path.display()))?;
        info!("wrote JSON report to {:?}", path);
    }

    if let Some(ref path) = cli.export_summary {
        fs::write(path, report::summary_text(&report))
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        info!("wrote summary to {:?}", path);
    }

    Ok(())
}

/// Keep only sessions belonging to the given workspace.
///
/// The id must be a valid UUID; a typo here would silently produce an empty
/// report, so it is validated up front.
fn filter_workspace(bundles: Vec<LogBundle>, workspace_id: &str) -> Result<Vec<LogBundle>> {
    let wanted = Uuid::parse_str(workspace_id)
        .with_context(|| format!("--workspace-id {workspace_id:?} is not a valid UUID"))?;

    let before = bundles.len();
    let filtered: Vec<LogBundle> = bundles
        .into_iter()
        .filter(|b| {
            Uuid::parse_str(&b.workspace_id)
                .map(|id| id == wanted)
                .unwrap_or(false)
        })
        .collect();

    if filtered.is_empty() && before > 0 {
        warn!(
            workspace = %wanted,
            "workspace filter matched none of the {before} sessions in the bundle"
        );
    }

    Ok(filtered)
}

/// Initialize the tracing subscriber for diagnostic logging on stderr.
///
/// # Verbosity Levels
/// - 0 (default): Only warnings and errors
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}
