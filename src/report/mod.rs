//! Report construction.
//!
//! [`build`] turns the per-session profiles into the final [`Report`].
//! Summary counters are always computed against the full profile set;
//! the `external_only` filter trims the detail section but never the
//! statistics, so a filtered report stays honest about the run as a whole.
//!
//! Ordering is deterministic: sessions sort by start time ascending, ties
//! broken by session id, regardless of worker completion order.

mod render;

pub use render::{print_summary, summary_text, to_json};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::SessionSecurityProfile;

/// The final security report for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Sessions analyzed, including any filtered out of `profiles`.
    pub total_sessions: usize,
    /// Sessions with at least one external connection, counted against the
    /// full unfiltered set.
    pub sessions_with_external_activity: usize,
    /// Sessions with at least one package-install command.
    pub sessions_with_package_installs: usize,
    /// Sessions with at least one logging-configuration change.
    pub sessions_with_logging_changes: usize,
    /// Sessions whose logging changes look like suppression.
    pub sessions_with_disabled_logging: usize,
    /// Number of trust patterns the run was configured with.
    pub trusted_domain_count: usize,
    /// Per-session detail, ordered by (start_time, session_id).
    pub profiles: Vec<SessionSecurityProfile>,
}

/// Build the report from aggregated profiles.
///
/// When `external_only` is set, profiles without external activity are
/// excluded from the detail section but still counted in every summary
/// field.
pub fn build(
    mut profiles: Vec<SessionSecurityProfile>,
    external_only: bool,
    trusted_domain_count: usize,
) -> Report {
    profiles.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });

    let total_sessions = profiles.len();
    let sessions_with_external_activity = profiles
        .iter()
        .filter(|p| p.has_external_activity)
        .count();
    let sessions_with_package_installs = profiles
        .iter()
        .filter(|p| !p.package_installs.is_empty())
        .count();
    let sessions_with_logging_changes = profiles
        .iter()
        .filter(|p| !p.logging_changes.is_empty())
        .count();
    let sessions_with_disabled_logging = profiles
        .iter()
        .filter(|p| p.has_disabled_logging)
        .count();

    if external_only {
        profiles.retain(|p| p.has_external_activity);
    }

    Report {
        generated_at: Utc::now(),
        total_sessions,
        sessions_with_external_activity,
        sessions_with_package_installs,
        sessions_with_logging_changes,
        sessions_with_disabled_logging,
        trusted_domain_count,
        profiles,
    }
}
