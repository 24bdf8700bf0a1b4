//! The analysis pipeline: bounded parallel session processing.
//!
//! [`run_pipeline`] is the single synchronous entry point. It builds a
//! multi-threaded tokio runtime, fans session bundles out to a
//! semaphore-bounded set of workers, joins them all, and performs one
//! deterministic sort while building the report. Sessions share nothing
//! mutable: each worker exclusively owns its bundle, and the trust catalog
//! is shared read-only behind an `Arc`.
//!
//! A session whose worker fails is isolated: its profile is emitted from
//! the bundle's metadata with a warning recorded, and every other session
//! completes normally.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, SessionSecurityProfile};
use crate::bundle::LogBundle;
use crate::catalog::TrustCatalog;
use crate::report::{self, Report};

/// Errors that can abort a pipeline run before analysis starts.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The worker runtime could not be constructed.
    #[error("failed to build worker runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Options controlling one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Exclude sessions without external activity from the report detail.
    pub external_only: bool,
    /// Maximum number of sessions processed concurrently.
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            external_only: false,
            workers: default_workers(),
        }
    }
}

/// Default worker bound: the available CPU count, capped at 8.
///
/// Parsing is pure in-memory text work, so more workers than cores buys
/// nothing.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(1)
}

/// Run the full analysis pipeline over a set of session bundles.
///
/// Always produces a [`Report`] (possibly empty); the catalog was already
/// validated at load time, and log content never causes a hard failure.
pub fn run_pipeline(
    bundles: Vec<LogBundle>,
    catalog: TrustCatalog,
    options: &PipelineOptions,
) -> Result<Report, PipelineError> {
    let trusted_domain_count = catalog.len();
    let catalog = Arc::new(catalog);
    let workers = options.workers.max(1);

    info!(
        sessions = bundles.len(),
        workers,
        external_only = options.external_only,
        "starting analysis pipeline"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let profiles = runtime.block_on(collect_profiles(bundles, catalog, workers));

    let report = report::build(profiles, options.external_only, trusted_domain_count);

    info!(
        total = report.total_sessions,
        external = report.sessions_with_external_activity,
        "pipeline complete"
    );

    Ok(report)
}

/// Process every bundle concurrently and collect the resulting profiles.
///
/// Completion order is irrelevant; the caller sorts once afterwards.
async fn collect_profiles(
    bundles: Vec<LogBundle>,
    catalog: Arc<TrustCatalog>,
    workers: usize,
) -> Vec<SessionSecurityProfile> {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<SessionSecurityProfile> = JoinSet::new();
    // Metadata skeletons, kept so a failed worker still yields a profile.
    let mut skeletons: HashMap<tokio::task::Id, SessionSecurityProfile> = HashMap::new();

    for bundle in bundles {
        let skeleton = SessionSecurityProfile::skeleton(&bundle);
        let semaphore = Arc::clone(&semaphore);
        let catalog = Arc::clone(&catalog);

        let handle = tasks.spawn(async move {
            // The semaphore is never closed while tasks run.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("worker semaphore closed");
            debug!(session = %bundle.session_id, "processing session");
            aggregate(&bundle, &catalog)
        });
        skeletons.insert(handle.id(), skeleton);
    }

    let mut profiles = Vec::with_capacity(skeletons.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, profile)) => {
                skeletons.remove(&id);
                profiles.push(profile);
            }
            Err(err) => {
                // Isolate the failed session; everything else continues.
                if let Some(mut skeleton) = skeletons.remove(&err.id()) {
                    warn!(
                        session = %skeleton.session_id,
                        error = %err,
                        "session processing failed; emitting partial profile"
                    );
                    skeleton.parse_warnings += 1;
                    profiles.push(skeleton);
                } else {
                    warn!(error = %err, "session worker failed with no known session");
                }
            }
        }
    }

    profiles
}
