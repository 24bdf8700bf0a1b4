//! Line classification rules.
//!
//! The rules are best-effort regex matching over arbitrary, untrusted log
//! text: a first-matching-rule-wins cascade where install and logging
//! markers are checked before connection extraction, since those lines
//! frequently embed URLs of their own (mirror indexes, config servers).

use std::sync::LazyLock;

use regex::Regex;

use super::events::{ConnectionRef, LogEvent, LoggingChange, PackageInstall, PackageManager};
use crate::bundle::StreamKind;

/// Punctuation stripped from the edges of extracted host tokens.
const EDGE_PUNCT: &[char] = &['.', ',', ';', '!', '?', ')', '(', '"', '\'', '`', '>', '<'];

/// URL-shaped references: `scheme://authority`, including JDBC subprotocol
/// URLs like `jdbc:mysql://host:3306` and cloud storage schemes
/// (s3/abfss/wasbs/gs).
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:jdbc:)?([a-z][a-z0-9+.-]{1,15})://([^\s"'<>|\\]+)"#)
        .expect("url regex")
});

/// Bare `host[:port]` references following known marker phrases.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:connecting to|established connection to|remote address[:\s]+|destination[:\s]+|target[:\s]+|GET\s+|POST\s+)\s*["']?([a-zA-Z0-9][a-zA-Z0-9._-]*)(?::(\d{1,5}))?"#,
    )
    .expect("marker regex")
});

/// Shell-style package-installation invocations.
static INSTALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(python3?\s+-m\s+pip|pip3?|conda|mamba|apt-get|apt)\s+install\b(.*)$")
        .expect("install regex")
});

/// Logging-reconfiguration markers.
static LOGGING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(logging\.basicConfig|logging\.disable|setLevel|addHandler|log4j|rootLogger|logger\.level|spark\.log\.level|spark\.sql\.adaptive\.logLevel)",
    )
    .expect("logging regex")
});

/// Classify one log line into exactly one event variant.
pub fn classify_line(line: &str, line_number: usize, stream: StreamKind) -> LogEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LogEvent::Unrecognized;
    }

    if let Some(install) = match_install(trimmed) {
        return LogEvent::PackageInstall(install);
    }
    if let Some(change) = match_logging(trimmed) {
        return LogEvent::LoggingChange(change);
    }
    if let Some(conn) = match_connection(trimmed, line_number, stream) {
        return LogEvent::Connection(conn);
    }

    LogEvent::Unrecognized
}

fn match_install(line: &str) -> Option<PackageInstall> {
    let caps = INSTALL_RE.captures(line)?;
    let invocation = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
    let rest = caps.get(2).map_or("", |m| m.as_str());

    let manager = if invocation.contains("pip") {
        PackageManager::Pip
    } else if invocation == "conda" {
        PackageManager::Conda
    } else {
        PackageManager::Other
    };

    let mut packages = Vec::new();
    for token in rest.split_whitespace() {
        // A shell operator ends the install command.
        if matches!(token, "&&" | "||" | "|" | ";") {
            break;
        }
        let cleaned = token.trim_matches(EDGE_PUNCT);
        if cleaned.is_empty() || cleaned.starts_with('-') || cleaned.contains("://") {
            continue;
        }
        packages.push(cleaned.to_string());
    }

    Some(PackageInstall {
        manager,
        raw_command: line.to_string(),
        packages,
    })
}

fn match_logging(line: &str) -> Option<LoggingChange> {
    let caps = LOGGING_RE.captures(line)?;
    Some(LoggingChange {
        raw_line: line.to_string(),
        config_key_hint: caps.get(1).map_or("", |m| m.as_str()).to_string(),
    })
}

fn match_connection(line: &str, line_number: usize, stream: StreamKind) -> Option<ConnectionRef> {
    if let Some(caps) = URL_RE.captures(line) {
        let scheme = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
        let authority = caps.get(2).map_or("", |m| m.as_str());
        let (host, port) = split_authority(authority);
        if !host.is_empty() {
            return Some(ConnectionRef {
                host,
                port,
                scheme: Some(scheme),
                raw_line: line.to_string(),
                line_number,
                stream,
            });
        }
    }

    if let Some(caps) = MARKER_RE.captures(line) {
        let host = caps
            .get(1)
            .map_or("", |m| m.as_str())
            .trim_matches(EDGE_PUNCT)
            .to_string();
        let port = caps.get(2).and_then(|m| m.as_str().parse::<u16>().ok());
        // Require either a dot or an explicit port, so prose like
        // "connecting to database" does not become an endpoint.
        if !host.is_empty() && (host.contains('.') || port.is_some()) {
            return Some(ConnectionRef {
                host,
                port,
                scheme: None,
                raw_line: line.to_string(),
                line_number,
                stream,
            });
        }
    }

    None
}

/// Split a URL authority into host and optional port.
///
/// Handles userinfo prefixes (`container@account.dfs.core.windows.net`),
/// path/query suffixes, and trailing punctuation. Multi-colon remainders
/// (IPv6 literals) are kept whole as the host.
fn split_authority(authority: &str) -> (String, Option<u16>) {
    let end = authority
        .find(['/', '?', '#'])
        .unwrap_or(authority.len());
    let mut auth = authority[..end].trim_matches(EDGE_PUNCT);

    if let Some(at) = auth.rfind('@') {
        auth = &auth[at + 1..];
    }

    if auth.matches(':').count() == 1 {
        if let Some((host, port)) = auth.split_once(':') {
            let host = host.trim_matches(EDGE_PUNCT).to_string();
            match port.parse::<u16>() {
                Ok(port) => return (host, Some(port)),
                Err(_) => return (host, None),
            }
        }
    }

    (auth.trim_matches(EDGE_PUNCT).to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> LogEvent {
        classify_line(line, 1, StreamKind::Stdout)
    }

    fn expect_connection(line: &str) -> ConnectionRef {
        match classify(line) {
            LogEvent::Connection(conn) => conn,
            other => panic!("expected Connection for {line:?}, got {other:?}"),
        }
    }

    fn expect_install(line: &str) -> PackageInstall {
        match classify(line) {
            LogEvent::PackageInstall(install) => install,
            other => panic!("expected PackageInstall for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_https_url_with_port_and_path() {
        let conn = expect_connection("Connecting to https://evil-exfil.io:443/upload");
        assert_eq!(conn.host, "evil-exfil.io");
        assert_eq!(conn.port, Some(443));
        assert_eq!(conn.scheme.as_deref(), Some("https"));
    }

    #[test]
    fn test_bare_host_after_marker() {
        let conn = expect_connection("Connecting to api.fabric.microsoft.com");
        assert_eq!(conn.host, "api.fabric.microsoft.com");
        assert_eq!(conn.port, None);
        assert_eq!(conn.scheme, None);
    }

    #[test]
    fn test_marker_host_port() {
        let conn = expect_connection("established connection to db-server:5432");
        assert_eq!(conn.host, "db-server");
        assert_eq!(conn.port, Some(5432));
    }

    #[test]
    fn test_marker_without_dot_or_port_rejected() {
        assert_eq!(classify("connecting to database"), LogEvent::Unrecognized);
    }

    #[test]
    fn test_jdbc_url() {
        let conn = expect_connection("opened jdbc:mysql://warehouse.internal:3306/sales");
        assert_eq!(conn.host, "warehouse.internal");
        assert_eq!(conn.port, Some(3306));
        assert_eq!(conn.scheme.as_deref(), Some("mysql"));
    }

    #[test]
    fn test_abfss_url_strips_container_userinfo() {
        let conn = expect_connection(
            "writing to abfss://workspace-id@onelakestore.dfs.core.windows.net/Tables/gold",
        );
        assert_eq!(conn.host, "onelakestore.dfs.core.windows.net");
        assert_eq!(conn.scheme.as_deref(), Some("abfss"));
        assert_eq!(conn.port, None);
    }

    #[test]
    fn test_url_tolerates_quotes_and_trailing_punctuation() {
        let conn = expect_connection(r#"fetching "https://files.pythonhosted.org"."#);
        assert_eq!(conn.host, "files.pythonhosted.org");
    }

    #[test]
    fn test_get_marker() {
        let conn = expect_connection("GET files.example.net:8080 200 OK");
        assert_eq!(conn.host, "files.example.net");
        assert_eq!(conn.port, Some(8080));
    }

    #[test]
    fn test_pip_install_excludes_flags() {
        let install = expect_install("pip install requests pandas --upgrade");
        assert_eq!(install.manager, PackageManager::Pip);
        assert_eq!(install.packages, vec!["requests", "pandas"]);
    }

    #[test]
    fn test_pip3_and_python_m_pip() {
        assert_eq!(
            expect_install("pip3 install numpy").manager,
            PackageManager::Pip
        );
        let install = expect_install("python -m pip install scipy==1.13.0");
        assert_eq!(install.manager, PackageManager::Pip);
        assert_eq!(install.packages, vec!["scipy==1.13.0"]);
    }

    #[test]
    fn test_conda_install() {
        let install = expect_install("conda install -y pyarrow");
        assert_eq!(install.manager, PackageManager::Conda);
        assert_eq!(install.packages, vec!["pyarrow"]);
    }

    #[test]
    fn test_install_index_url_not_a_package() {
        let install = expect_install("pip install -i https://mirror.internal/simple requests");
        assert_eq!(install.packages, vec!["requests"]);
    }

    #[test]
    fn test_install_stops_at_shell_operator() {
        let install = expect_install("pip install requests && curl evil.io");
        assert_eq!(install.packages, vec!["requests"]);
    }

    #[test]
    fn test_install_takes_priority_over_embedded_url() {
        // The mirror URL must not turn the install line into a connection.
        assert!(matches!(
            classify("pip install --index-url https://mirror.internal/simple requests"),
            LogEvent::PackageInstall(_)
        ));
    }

    #[test]
    fn test_logging_markers() {
        for (line, hint) in [
            ("logging.basicConfig(level=logging.CRITICAL)", "logging.basicConfig"),
            ("logger.setLevel(logging.ERROR)", "setLevel"),
            ("root.addHandler(NullHandler())", "addHandler"),
            ("log4j.rootLogger=OFF", "log4j"),
            ("set spark.log.level=WARN", "spark.log.level"),
        ] {
            match classify(line) {
                LogEvent::LoggingChange(change) => {
                    assert_eq!(change.config_key_hint, hint, "line {line:?}");
                }
                other => panic!("expected LoggingChange for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unmatched_line_is_unrecognized() {
        assert_eq!(
            classify("26/08/29 12:00:01 INFO TaskSetManager: Finished task 3.0"),
            LogEvent::Unrecognized
        );
        assert_eq!(classify(""), LogEvent::Unrecognized);
        assert_eq!(classify("   "), LogEvent::Unrecognized);
    }

    #[test]
    fn test_split_authority_edge_cases() {
        assert_eq!(
            split_authority("host.com:443/upload"),
            ("host.com".to_string(), Some(443))
        );
        assert_eq!(split_authority("host.com"), ("host.com".to_string(), None));
        assert_eq!(
            split_authority("user@host.com:22"),
            ("host.com".to_string(), Some(22))
        );
        // Multi-colon (IPv6-ish) stays whole.
        assert_eq!(split_authority("::1"), ("::1".to_string(), None));
        // Out-of-range port is dropped, host kept.
        assert_eq!(
            split_authority("host.com:99999"),
            ("host.com".to_string(), None)
        );
    }
}
