//! Endpoint classification against the trust catalog.
//!
//! [`classify`] is a pure function: the same connection reference and
//! catalog always produce the same trust result. The host is normalized
//! (lowercased, stripped of stray punctuation and trailing dots) before
//! lookup, so `API.Fabric.Microsoft.COM.` and `api.fabric.microsoft.com`
//! classify identically.

use serde::Serialize;

use crate::catalog::TrustCatalog;
use crate::parser::ConnectionRef;

/// A connection reference with its trust decision attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedConnection {
    /// The underlying connection reference.
    #[serde(flatten)]
    pub conn: ConnectionRef,
    /// Whether the host matched the trust catalog.
    pub trusted: bool,
    /// The catalog pattern that matched, if any.
    pub matched_pattern: Option<String>,
}

/// Normalize a raw extracted host for catalog lookup.
///
/// Lowercases, strips surrounding whitespace/quotes/parentheses, drops any
/// path or query suffix that survived extraction, and removes the trailing
/// dot of a fully-qualified name.
pub fn normalize_host(raw: &str) -> String {
    let mut host = raw.trim().trim_matches(['"', '\'', '(', ')', ',', ';']);

    if let Some(end) = host.find(['/', '?', '#']) {
        host = &host[..end];
    }

    host.trim_end_matches('.').to_lowercase()
}

/// Classify a connection reference as trusted or external.
pub fn classify(conn: ConnectionRef, catalog: &TrustCatalog) -> ClassifiedConnection {
    let decision = catalog.classify(&normalize_host(&conn.host));
    ClassifiedConnection {
        conn,
        trusted: decision.trusted,
        matched_pattern: decision.matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::StreamKind;

    fn catalog() -> TrustCatalog {
        TrustCatalog::load(&[
            "api.fabric.microsoft.com".to_string(),
            "*.notebook.windows.net".to_string(),
        ])
        .expect("catalog")
    }

    fn conn(host: &str) -> ConnectionRef {
        ConnectionRef {
            host: host.to_string(),
            port: None,
            scheme: None,
            raw_line: format!("Connecting to {host}"),
            line_number: 1,
            stream: StreamKind::Stdout,
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("API.Fabric.Microsoft.COM."), "api.fabric.microsoft.com");
        assert_eq!(normalize_host("  \"host.com\", "), "host.com");
        assert_eq!(normalize_host("host.com/path?q=1"), "host.com");
        assert_eq!(normalize_host(""), "");
    }

    #[test]
    fn test_trusted_and_external() {
        let cat = catalog();
        let trusted = classify(conn("api.fabric.microsoft.com"), &cat);
        assert!(trusted.trusted);
        assert_eq!(
            trusted.matched_pattern.as_deref(),
            Some("api.fabric.microsoft.com")
        );

        let external = classify(conn("evil-exfil.io"), &cat);
        assert!(!external.trusted);
        assert!(external.matched_pattern.is_none());
    }

    #[test]
    fn test_classification_survives_denormalized_input() {
        let cat = catalog();
        let classified = classify(conn("Exec.EastUS.Notebook.Windows.Net."), &cat);
        assert!(classified.trusted);
        assert_eq!(
            classified.matched_pattern.as_deref(),
            Some("*.notebook.windows.net")
        );
    }

    #[test]
    fn test_classify_is_pure() {
        let cat = catalog();
        let a = classify(conn("evil-exfil.io"), &cat);
        let b = classify(conn("evil-exfil.io"), &cat);
        assert_eq!(a, b);
    }
}
