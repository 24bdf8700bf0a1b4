//! Trusted-domain catalog and pattern matching.
//!
//! The catalog holds the set of domain patterns considered internal
//! infrastructure. It is built once from configuration, validated up front,
//! and shared read-only by every session worker.
//!
//! # Pattern Matching
//!
//! - Exact match: `api.fabric.microsoft.com`
//! - Wildcard match: `*.notebook.windows.net` matches
//!   `exec.eastus.notebook.windows.net` but NOT `notebook.windows.net`
//!   itself, and NOT `evilnotebook.windows.net`
//!
//! All matching is case-insensitive. An empty or unresolvable host is
//! classified external: the failure mode is "flag it", never "trust it".

use std::collections::HashSet;

use thiserror::Error;

/// Errors produced while building a [`TrustCatalog`].
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No usable patterns were configured.
    ///
    /// An empty catalog would silently classify every connection as
    /// external and produce a misleading report, so loading fails fast
    /// instead.
    #[error("trust catalog contains no patterns; configure at least one trusted domain")]
    EmptyCatalog,

    /// A pattern is malformed (blank, embedded whitespace, or a `*` that
    /// is not a leading `*.` wildcard).
    #[error("invalid trust pattern {0:?}")]
    InvalidPattern(String),
}

/// How a trust pattern matches hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Matches only an identical host (case-insensitive).
    Exact,
    /// `*.suffix` pattern matching any proper subdomain of the suffix.
    WildcardSuffix,
}

/// A single configured trust pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPattern {
    /// The pattern text as configured (lowercased).
    pub pattern: String,
    /// Whether this is an exact or wildcard-suffix pattern.
    pub kind: PatternKind,
}

/// Result of looking a host up in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustDecision {
    /// Whether the host matched any trusted pattern.
    pub trusted: bool,
    /// The pattern that matched, if any.
    pub matched: Option<String>,
}

/// Immutable set of trusted-domain patterns.
///
/// Insertion order is irrelevant; any matching pattern suffices. Exact
/// patterns are consulted before wildcards only because set lookup is the
/// cheap path, not as a precedence rule.
#[derive(Debug, Clone)]
pub struct TrustCatalog {
    /// Exact-match hosts, lowercased.
    exact: HashSet<String>,
    /// Wildcard `*.suffix` patterns, lowercased.
    wildcards: Vec<String>,
    /// All patterns in configured order, for listing and reporting.
    patterns: Vec<TrustPattern>,
}

impl TrustCatalog {
    /// Build a catalog from configured pattern strings.
    ///
    /// Blank entries are rejected, as is any `*` that does not form a
    /// leading `*.` wildcard. An empty pattern list is a configuration
    /// error.
    pub fn load(patterns: &[String]) -> Result<Self, CatalogError> {
        let mut exact = HashSet::new();
        let mut wildcards = Vec::new();
        let mut kept = Vec::new();

        for raw in patterns {
            let pattern = raw.trim().to_lowercase();
            if pattern.is_empty() || pattern.chars().any(char::is_whitespace) {
                return Err(CatalogError::InvalidPattern(raw.clone()));
            }

            if let Some(suffix) = pattern.strip_prefix("*.") {
                if suffix.is_empty() || suffix.contains('*') {
                    return Err(CatalogError::InvalidPattern(raw.clone()));
                }
                wildcards.push(pattern.clone());
                kept.push(TrustPattern {
                    pattern,
                    kind: PatternKind::WildcardSuffix,
                });
            } else {
                if pattern.contains('*') {
                    return Err(CatalogError::InvalidPattern(raw.clone()));
                }
                exact.insert(pattern.clone());
                kept.push(TrustPattern {
                    pattern,
                    kind: PatternKind::Exact,
                });
            }
        }

        if kept.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        Ok(Self {
            exact,
            wildcards,
            patterns: kept,
        })
    }

    /// Classify a host as trusted or external.
    ///
    /// The host is lowercased before lookup. An empty host is external.
    pub fn classify(&self, host: &str) -> TrustDecision {
        let host = host.to_lowercase();
        if host.is_empty() {
            return TrustDecision {
                trusted: false,
                matched: None,
            };
        }

        if let Some(pattern) = self.exact.get(&host) {
            return TrustDecision {
                trusted: true,
                matched: Some(pattern.clone()),
            };
        }

        for pattern in &self.wildcards {
            if matches_wildcard(pattern, &host) {
                return TrustDecision {
                    trusted: true,
                    matched: Some(pattern.clone()),
                };
            }
        }

        TrustDecision {
            trusted: false,
            matched: None,
        }
    }

    /// Number of configured patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the catalog has no patterns (never true after `load`).
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All configured patterns, in configuration order.
    pub fn patterns(&self) -> &[TrustPattern] {
        &self.patterns
    }
}

/// Check if a host matches a `*.suffix` wildcard pattern.
///
/// Pattern `*.example.com` matches `sub.example.com` and
/// `deep.sub.example.com`, but NOT `example.com` itself and NOT
/// `fakeexample.com`.
fn matches_wildcard(pattern: &str, host: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("*.") {
        if host.ends_with(suffix) {
            let prefix_len = host.len() - suffix.len();
            // At least one label and a dot must precede the suffix.
            prefix_len > 0 && host.as_bytes().get(prefix_len - 1) == Some(&b'.')
        } else {
            false
        }
    } else {
        pattern == host
    }
}
