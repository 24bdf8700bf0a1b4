//! Session log bundles and the consolidated-file loader.
//!
//! A [`LogBundle`] is the unit of input to the pipeline: one notebook
//! session's metadata plus the raw text of its three log streams. Bundles
//! are produced by an external log-retrieval tool that walks the Fabric
//! Livy API and writes everything into one consolidated JSON file; this
//! module only reads that file. The analysis core never performs network
//! I/O itself.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Filename prefix the extraction tool uses for consolidated bundles.
pub const CONSOLIDATED_PREFIX: &str = "consolidated_spark_logs_";

/// Errors produced while loading a consolidated bundle file.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle file could not be read.
    #[error("failed to read bundle file {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The bundle file is not valid consolidated JSON.
    #[error("failed to parse bundle file {path}: {source}")]
    Parse {
        /// Path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Which of the three per-session log streams a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// The Livy session log.
    Livy,
    /// Driver stdout.
    Stdout,
    /// Driver stderr.
    Stderr,
}

impl StreamKind {
    /// All streams in canonical merge order: livy, then stdout, then stderr.
    pub const ALL: [StreamKind; 3] = [StreamKind::Livy, StreamKind::Stdout, StreamKind::Stderr];

    /// Stream name as it appears in bundle files and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Livy => "livy",
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw text of one log stream for one session.
///
/// The text may be arbitrarily malformed; nothing downstream assumes any
/// structure beyond line breaks.
#[derive(Debug, Clone)]
pub struct RawLogFile {
    /// Session the stream belongs to.
    pub session_id: String,
    /// Which stream this is.
    pub stream: StreamKind,
    /// The raw log text.
    pub text: String,
}

/// One session's metadata and log streams, as supplied by the retrieval
/// collaborator. Immutable input to the pipeline.
#[derive(Debug, Clone)]
pub struct LogBundle {
    /// Livy session id.
    pub session_id: String,
    /// Notebook the session executed.
    pub notebook_id: String,
    /// Human-readable notebook name.
    pub notebook_name: String,
    /// Workspace id (UUID string as reported by the service).
    pub workspace_id: String,
    /// Human-readable workspace name.
    pub workspace_name: String,
    /// Spark monitoring URL for the session.
    pub app_url: String,
    /// Session start time.
    pub start_time: DateTime<Utc>,
    /// Session status as reported by the service (e.g. "Stopped").
    pub status: String,
    /// The log streams that were retrieved. A stream the retrieval tool
    /// could not download is simply absent here.
    pub files: Vec<RawLogFile>,
}

impl LogBundle {
    /// Look up one stream of this bundle, if it was retrieved.
    pub fn stream(&self, kind: StreamKind) -> Option<&RawLogFile> {
        self.files.iter().find(|f| f.stream == kind)
    }
}

/// On-disk shape of the consolidated file.
#[derive(Debug, Deserialize)]
struct ConsolidatedFile {
    #[serde(default)]
    log_summaries: Vec<SessionSummary>,
}

/// One session entry of the consolidated file.
#[derive(Debug, Deserialize)]
struct SessionSummary {
    livy_id: String,
    #[serde(default)]
    notebook_id: String,
    #[serde(default)]
    notebook_name: String,
    #[serde(default)]
    workspace_id: String,
    #[serde(default)]
    workspace_name: String,
    #[serde(default)]
    app_url: String,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    logs: StreamTexts,
}

/// The raw stream texts of one session. Any stream may be missing.
#[derive(Debug, Default, Deserialize)]
struct StreamTexts {
    #[serde(default)]
    livy: Option<String>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
}

/// Load all session bundles from a consolidated JSON file.
///
/// Only structural problems with the file itself are errors; a session
/// entry with missing streams still yields a bundle (the aggregator
/// records the gap as a warning on that session).
pub fn load_consolidated(path: &Path) -> Result<Vec<LogBundle>, BundleError> {
    let text = fs::read_to_string(path).map_err(|source| BundleError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file: ConsolidatedFile =
        serde_json::from_str(&text).map_err(|source| BundleError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        sessions = file.log_summaries.len(),
        "loaded consolidated bundle file {:?}", path
    );

    let bundles = file
        .log_summaries
        .into_iter()
        .map(summary_into_bundle)
        .collect();
    Ok(bundles)
}

fn summary_into_bundle(summary: SessionSummary) -> LogBundle {
    let mut files = Vec::new();
    let streams = [
        (StreamKind::Livy, summary.logs.livy),
        (StreamKind::Stdout, summary.logs.stdout),
        (StreamKind::Stderr, summary.logs.stderr),
    ];
    for (stream, text) in streams {
        match text {
            Some(text) => files.push(RawLogFile {
                session_id: summary.livy_id.clone(),
                stream,
                text,
            }),
            None => {
                warn!(
                    session = %summary.livy_id,
                    stream = %stream,
                    "stream missing from bundle"
                );
            }
        }
    }

    LogBundle {
        session_id: summary.livy_id,
        notebook_id: summary.notebook_id,
        notebook_name: summary.notebook_name,
        workspace_id: summary.workspace_id,
        workspace_name: summary.workspace_name,
        app_url: summary.app_url,
        start_time: summary.start_time.unwrap_or(DateTime::UNIX_EPOCH),
        status: summary.status,
        files,
    }
}

/// Find the newest consolidated bundle file, checking `output/` first and
/// then the current directory. Returns `None` if nothing matches.
pub fn find_latest_consolidated() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    for dir in ["output", "."] {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(CONSOLIDATED_PREFIX) && name.ends_with(".json") {
                candidates.push(entry.path());
            }
        }
    }
    // Timestamps embedded in the filename sort lexicographically.
    candidates.sort();
    candidates.pop()
}
