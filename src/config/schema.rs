//! Configuration schema definitions.
//!
//! Configuration is loaded from multiple sources and merged in order:
//!
//! 1. Embedded defaults (compiled into the binary)
//! 2. User config: `~/.config/spark-audit/config.toml`
//! 3. Additional config file (via `--config` flag)
//! 4. CLI flags (highest priority)
//!
//! Lists (trusted domains) are **merged** (appended). Scalars (workers,
//! log_level) are **overridden**.

use serde::{Deserialize, Serialize};

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Trust catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Merge another config into this one.
    ///
    /// Lists are merged (appended), scalars are overridden if non-default.
    pub fn merge(&mut self, other: Config) {
        self.general.merge(other.general);
        self.analysis.merge(other.analysis);
        self.catalog.merge(other.catalog);
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default)]
    pub log_level: String,
}

impl GeneralConfig {
    fn merge(&mut self, other: GeneralConfig) {
        if !other.log_level.is_empty() {
            self.log_level = other.log_level;
        }
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Maximum number of sessions processed concurrently.
    /// 0 = pick automatically.
    #[serde(default)]
    pub workers: usize,
}

impl AnalysisConfig {
    fn merge(&mut self, other: AnalysisConfig) {
        if other.workers != 0 {
            self.workers = other.workers;
        }
    }
}

/// Trust catalog settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Trusted domain patterns.
    ///
    /// Supports wildcards: `*.notebook.windows.net` matches any proper
    /// subdomain but not the bare suffix.
    #[serde(default)]
    pub trusted_domains: Vec<String>,
}

impl CatalogConfig {
    fn merge(&mut self, other: CatalogConfig) {
        self.trusted_domains.extend(other.trusted_domains);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "");
        assert_eq!(config.analysis.workers, 0);
        assert!(config.catalog.trusted_domains.is_empty());
    }

    #[test]
    fn test_config_merge_scalars() {
        let mut base = Config::default();
        base.merge(Config {
            general: GeneralConfig {
                log_level: "debug".to_string(),
            },
            analysis: AnalysisConfig { workers: 4 },
            ..Default::default()
        });

        assert_eq!(base.general.log_level, "debug");
        assert_eq!(base.analysis.workers, 4);
    }

    #[test]
    fn test_config_merge_lists() {
        let mut base = Config {
            catalog: CatalogConfig {
                trusted_domains: vec!["api.fabric.microsoft.com".to_string()],
            },
            ..Default::default()
        };
        base.merge(Config {
            catalog: CatalogConfig {
                trusted_domains: vec!["extra.corp".to_string()],
            },
            ..Default::default()
        });

        assert_eq!(base.catalog.trusted_domains.len(), 2);
        assert!(base
            .catalog
            .trusted_domains
            .contains(&"api.fabric.microsoft.com".to_string()));
        assert!(base.catalog.trusted_domains.contains(&"extra.corp".to_string()));
    }

    #[test]
    fn test_merge_does_not_reset_to_defaults() {
        let mut base = Config {
            general: GeneralConfig {
                log_level: "info".to_string(),
            },
            analysis: AnalysisConfig { workers: 2 },
            ..Default::default()
        };
        base.merge(Config::default());

        assert_eq!(base.general.log_level, "info");
        assert_eq!(base.analysis.workers, 2);
    }

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
            [general]
            log_level = "trace"

            [analysis]
            workers = 6

            [catalog]
            trusted_domains = ["custom.corp", "*.custom.corp"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "trace");
        assert_eq!(config.analysis.workers, 6);
        assert_eq!(config.catalog.trusted_domains.len(), 2);
    }

    #[test]
    fn test_default_toml_parses() {
        // Verify that the shipped default config parses correctly.
        let toml_content = include_str!("../../config/default.toml");
        let config: Config =
            toml::from_str(toml_content).expect("default.toml should parse as Config");

        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.analysis.workers, 0);
        assert!(config
            .catalog
            .trusted_domains
            .contains(&"api.fabric.microsoft.com".to_string()));
        assert!(config
            .catalog
            .trusted_domains
            .contains(&"*.notebook.windows.net".to_string()));
        assert!(config.catalog.trusted_domains.contains(&"localhost".to_string()));
    }
}
