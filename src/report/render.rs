//! Report serialization sinks: console, text summary, JSON.
//!
//! These are plain functions over a finished [`Report`]; the caller owns
//! persistence. Nothing here feeds back into the analysis core.

use std::fmt::Write as _;

use super::Report;
use crate::aggregate::SessionSecurityProfile;

/// Print the comprehensive summary to stdout.
pub fn print_summary(report: &Report) {
    print!("{}", summary_text(report));
}

/// Serialize the full report (summary plus per-session detail) to
/// pretty-printed JSON.
pub fn to_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render the human-readable analysis summary.
pub fn summary_text(report: &Report) -> String {
    let mut out = String::new();
    let rule = "=".repeat(78);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "SPARK SESSION SECURITY ANALYSIS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Total sessions analyzed:          {}", report.total_sessions);
    let _ = writeln!(
        out,
        "Sessions with EXTERNAL activity:  {}",
        report.sessions_with_external_activity
    );
    let _ = writeln!(
        out,
        "Sessions with package installs:   {}",
        report.sessions_with_package_installs
    );
    let _ = writeln!(
        out,
        "Sessions with logging changes:    {}",
        report.sessions_with_logging_changes
    );
    let _ = writeln!(
        out,
        "Sessions with disabled logging:   {}",
        report.sessions_with_disabled_logging
    );
    let _ = writeln!(
        out,
        "Trusted domain patterns:          {}",
        report.trusted_domain_count
    );

    let external: Vec<&SessionSecurityProfile> = report
        .profiles
        .iter()
        .filter(|p| p.has_external_activity)
        .collect();

    if external.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "No external connections found; all detected traffic matches the trust catalog."
        );
    } else {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "!!! SESSIONS WITH EXTERNAL CONNECTIONS ({}) - SECURITY REVIEW NEEDED !!!",
            external.len()
        );
        for (i, profile) in external.iter().enumerate() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}. {} (session {})",
                i + 1,
                display_name(profile),
                profile.session_id
            );
            let _ = writeln!(out, "   Workspace:  {}", profile.workspace_name);
            let _ = writeln!(
                out,
                "   External: {}, Trusted: {}",
                profile.external_count(),
                profile.trusted_count()
            );
            if !profile.app_url.is_empty() {
                let _ = writeln!(out, "   Monitor:    {}", profile.app_url);
            }
            let hosts: Vec<String> = profile.external_hosts().into_iter().collect();
            let _ = writeln!(out, "   External hosts: {}", hosts.join(", "));
        }
    }

    if report.profiles.iter().any(|p| !p.package_installs.is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "PACKAGE INSTALLS");
        for profile in &report.profiles {
            if profile.package_installs.is_empty() {
                continue;
            }
            let _ = writeln!(
                out,
                "  {} ({}): {} install command(s)",
                display_name(profile),
                profile.session_id,
                profile.package_installs.len()
            );
            for install in &profile.package_installs {
                let _ = writeln!(out, "    > {}", install.raw_command);
            }
        }
    }

    if report.profiles.iter().any(|p| !p.logging_changes.is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "LOGGING CONFIGURATION");
        for profile in &report.profiles {
            if profile.logging_changes.is_empty() {
                continue;
            }
            let status = if profile.has_disabled_logging {
                "SUPPRESSED"
            } else {
                "modified"
            };
            let _ = writeln!(
                out,
                "  {} ({}): {} change(s), logging {}",
                display_name(profile),
                profile.session_id,
                profile.logging_changes.len(),
                status
            );
        }
    }

    let with_warnings = report
        .profiles
        .iter()
        .filter(|p| p.parse_warnings > 0)
        .count();
    if with_warnings > 0 {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} session(s) had parse warnings (unrecognized lines or missing streams).",
            with_warnings
        );
    }

    out
}

fn display_name(profile: &SessionSecurityProfile) -> &str {
    if profile.notebook_name.is_empty() {
        "<unnamed notebook>"
    } else {
        &profile.notebook_name
    }
}
