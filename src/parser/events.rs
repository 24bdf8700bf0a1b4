//! Typed line-level events extracted from log streams.
//!
//! Every log line maps to exactly one [`LogEvent`] variant. `Unrecognized`
//! absorbs anything the rules cannot interpret, so unparseable content is
//! counted rather than raised as an error.

use serde::Serialize;

use crate::bundle::StreamKind;

/// A single parsed log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    /// The line references an outbound network endpoint.
    Connection(ConnectionRef),
    /// The line is a package-installation command.
    PackageInstall(PackageInstall),
    /// The line reconfigures logging.
    LoggingChange(LoggingChange),
    /// The line matched no rule. Counted as a parse warning downstream.
    Unrecognized,
}

/// A network endpoint referenced by a log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionRef {
    /// Hostname as extracted (not yet normalized).
    pub host: String,
    /// Explicit port, if the line carried one.
    pub port: Option<u16>,
    /// URL scheme, if the reference was URL-shaped (lowercased).
    pub scheme: Option<String>,
    /// The full source line, trimmed.
    pub raw_line: String,
    /// 1-based line number within the stream, for traceability.
    pub line_number: usize,
    /// Which stream the line came from.
    pub stream: StreamKind,
}

/// Which package manager an install command invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
    /// pip, pip3, or `python -m pip`.
    Pip,
    /// conda.
    Conda,
    /// Some other recognized installer (mamba, apt).
    Other,
}

/// A shell-style package-installation command found in a log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageInstall {
    /// The package manager invoked.
    pub manager: PackageManager,
    /// The full command line, trimmed.
    pub raw_command: String,
    /// Package name tokens following the install subcommand, with flag
    /// tokens (leading `-`) excluded.
    pub packages: Vec<String>,
}

/// A logging-reconfiguration marker found in a log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingChange {
    /// The full source line, trimmed.
    pub raw_line: String,
    /// The configuration keyword that matched, as written in the line.
    pub config_key_hint: String,
}

impl LoggingChange {
    /// Whether this change looks like it suppresses logging output.
    ///
    /// Mirrors the heuristic of checking the line for disable/off/false
    /// markers; used for the report's disabled-logging summary.
    pub fn suppresses_logging(&self) -> bool {
        let line = self.raw_line.to_lowercase();
        ["disable", "off", "false"]
            .iter()
            .any(|needle| line.contains(needle))
    }
}
