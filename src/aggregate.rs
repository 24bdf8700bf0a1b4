//! Per-session aggregation of parsed events.
//!
//! [`aggregate`] merges the events of one session's three log streams into
//! a single [`SessionSecurityProfile`]: connections are classified and
//! deduplicated, install commands and logging changes are collected in
//! canonical stream order (livy, then stdout, then stderr, each preserving
//! its internal line order), and unrecognized lines are counted as parse
//! warnings. A session with no parseable signal still yields a profile
//! with empty collections; absence of signal is not a failure.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::bundle::{LogBundle, StreamKind};
use crate::catalog::TrustCatalog;
use crate::classify::{classify, normalize_host, ClassifiedConnection};
use crate::parser::{self, ConnectionRef, LogEvent, LoggingChange, PackageInstall};

/// The complete security picture of one session.
///
/// Built exclusively by the aggregation worker that owns the session's
/// bundle; immutable once emitted.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSecurityProfile {
    /// Livy session id.
    pub session_id: String,
    /// Notebook the session executed.
    pub notebook_id: String,
    /// Human-readable notebook name.
    pub notebook_name: String,
    /// Human-readable workspace name.
    pub workspace_name: String,
    /// Spark monitoring URL.
    pub app_url: String,
    /// Session start time.
    pub start_time: DateTime<Utc>,
    /// Session status as reported by the service.
    pub status: String,
    /// Classified connections, deduplicated by (host, port, scheme).
    pub connections: Vec<ClassifiedConnection>,
    /// Package-install commands, in canonical stream order.
    pub package_installs: Vec<PackageInstall>,
    /// Logging-configuration changes, in canonical stream order.
    pub logging_changes: Vec<LoggingChange>,
    /// True iff at least one connection is untrusted.
    pub has_external_activity: bool,
    /// True iff a logging change looks like it suppresses output.
    pub has_disabled_logging: bool,
    /// Unrecognized lines plus structural gaps (missing streams).
    pub parse_warnings: u32,
}

impl SessionSecurityProfile {
    /// An empty profile carrying only the bundle's metadata.
    ///
    /// Used as the starting point of aggregation and as the fallback when
    /// a session's processing fails outright.
    pub fn skeleton(bundle: &LogBundle) -> Self {
        Self {
            session_id: bundle.session_id.clone(),
            notebook_id: bundle.notebook_id.clone(),
            notebook_name: bundle.notebook_name.clone(),
            workspace_name: bundle.workspace_name.clone(),
            app_url: bundle.app_url.clone(),
            start_time: bundle.start_time,
            status: bundle.status.clone(),
            connections: Vec::new(),
            package_installs: Vec::new(),
            logging_changes: Vec::new(),
            has_external_activity: false,
            has_disabled_logging: false,
            parse_warnings: 0,
        }
    }

    /// Number of trusted connections retained.
    pub fn trusted_count(&self) -> usize {
        self.connections.iter().filter(|c| c.trusted).count()
    }

    /// Number of external connections retained.
    pub fn external_count(&self) -> usize {
        self.connections.iter().filter(|c| !c.trusted).count()
    }

    /// Sorted unique `host[:port]` strings of the external connections.
    pub fn external_hosts(&self) -> BTreeSet<String> {
        self.connections
            .iter()
            .filter(|c| !c.trusted)
            .map(|c| match c.conn.port {
                Some(port) => format!("{}:{}", normalize_host(&c.conn.host), port),
                None => normalize_host(&c.conn.host),
            })
            .collect()
    }
}

/// Dedup key: normalized host, effective port, effective scheme.
///
/// A missing scheme defaults to `http` and a missing port to the scheme's
/// well-known port, so `http://host.com:443` and a bare `host.com:443`
/// collapse into one retained connection.
fn dedup_key(conn: &ConnectionRef) -> (String, u16, String) {
    let host = normalize_host(&conn.host);
    let scheme = conn
        .scheme
        .clone()
        .unwrap_or_else(|| "http".to_string());
    let port = conn.port.unwrap_or_else(|| default_port(&scheme));
    (host, port, scheme)
}

/// Well-known default port for a scheme; 0 when there is none.
fn default_port(scheme: &str) -> u16 {
    match scheme {
        "http" | "ws" => 80,
        "https" | "wss" | "abfs" | "abfss" | "wasb" | "wasbs" | "gs" | "s3" | "s3a" => 443,
        "ftp" => 21,
        "sftp" => 22,
        "mongodb" => 27017,
        _ => 0,
    }
}

/// Merge one session's streams into its security profile.
///
/// Never fails: malformed content only increments `parse_warnings`, and a
/// missing stream counts as one warning on the owning session.
pub fn aggregate(bundle: &LogBundle, catalog: &TrustCatalog) -> SessionSecurityProfile {
    let mut profile = SessionSecurityProfile::skeleton(bundle);
    let mut seen_keys: HashSet<(String, u16, String)> = HashSet::new();
    let mut seen_hosts: HashSet<String> = HashSet::new();

    for kind in StreamKind::ALL {
        let file = match bundle.stream(kind) {
            Some(file) => file,
            None => {
                profile.parse_warnings += 1;
                continue;
            }
        };

        for event in parser::parse(file) {
            match event {
                LogEvent::Connection(conn) => {
                    record_connection(&mut profile, &mut seen_keys, &mut seen_hosts, conn, catalog);
                }
                LogEvent::PackageInstall(install) => profile.package_installs.push(install),
                LogEvent::LoggingChange(change) => {
                    if change.suppresses_logging() {
                        profile.has_disabled_logging = true;
                    }
                    profile.logging_changes.push(change);
                }
                LogEvent::Unrecognized => profile.parse_warnings += 1,
            }
        }
    }

    profile.has_external_activity = profile.connections.iter().any(|c| !c.trusted);

    debug!(
        session = %profile.session_id,
        connections = profile.connections.len(),
        external = profile.external_count(),
        installs = profile.package_installs.len(),
        warnings = profile.parse_warnings,
        "aggregated session"
    );

    profile
}

fn record_connection(
    profile: &mut SessionSecurityProfile,
    seen_keys: &mut HashSet<(String, u16, String)>,
    seen_hosts: &mut HashSet<String>,
    conn: ConnectionRef,
    catalog: &TrustCatalog,
) {
    let host = normalize_host(&conn.host);
    if host.is_empty() {
        profile.parse_warnings += 1;
        return;
    }

    // A sighting with neither port nor scheme adds nothing once any
    // variant of the host is retained.
    if conn.port.is_none() && conn.scheme.is_none() && seen_hosts.contains(&host) {
        return;
    }

    let key = dedup_key(&conn);
    if !seen_keys.insert(key) {
        return;
    }
    seen_hosts.insert(host);

    profile.connections.push(classify(conn, catalog));
}
