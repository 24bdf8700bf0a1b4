//! Configuration loading with hierarchy merging.
//!
//! Configuration is loaded from multiple sources and merged in order:
//!
//! 1. Embedded defaults (the shipped `config/default.toml`, which carries
//!    the Fabric/Azure trust catalog)
//! 2. User config: `~/.config/spark-audit/config.toml`
//! 3. Additional config file (via `--config` flag)
//! 4. CLI `--add-trusted-domain` flags (highest priority)
//!
//! Trusted-domain lists are **merged** (appended); scalars are
//! **overridden**. A missing user config is skipped silently; a missing
//! `--config` file is an error.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ConfigError;
use super::schema::{CatalogConfig, Config};
use crate::cli::Cli;

/// User configuration directory name.
pub const USER_CONFIG_DIR: &str = "spark-audit";

/// User configuration filename.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// The shipped default configuration, compiled into the binary.
const EMBEDDED_DEFAULT: &str = include_str!("../../config/default.toml");

/// Configuration loader with support for hierarchy merging.
pub struct ConfigLoader {
    /// Path to user configuration.
    user_path: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a ConfigLoader with the default user-config path.
    #[must_use]
    pub fn new() -> Self {
        let user_config_dir = dirs::config_dir()
            .map(|p| p.join(USER_CONFIG_DIR))
            .unwrap_or_else(|| PathBuf::from(".config").join(USER_CONFIG_DIR));

        Self {
            user_path: user_config_dir.join(USER_CONFIG_FILE),
        }
    }

    /// Create a ConfigLoader with a custom user-config path (for testing).
    #[must_use]
    pub fn with_user_path(user_path: PathBuf) -> Self {
        Self { user_path }
    }

    /// Load and merge configuration from all sources.
    pub fn load(&self, cli: &Cli) -> Result<Config, ConfigError> {
        // Start with the embedded defaults.
        let mut config: Config =
            toml::from_str(EMBEDDED_DEFAULT).map_err(|source| ConfigError::ParseError {
                path: PathBuf::from("<embedded default.toml>"),
                source,
            })?;
        debug!("loaded embedded default configuration");

        // Merge the user config, if present.
        if let Some(user_config) = self.load_file(&self.user_path)? {
            config.merge(user_config);
            debug!("loaded user config from {:?}", self.user_path);
        } else {
            debug!("no user config found at {:?}", self.user_path);
        }

        // Merge an additional config file from the CLI.
        if let Some(ref cli_config_path) = cli.config {
            match self.load_file(cli_config_path)? {
                Some(cli_config) => {
                    config.merge(cli_config);
                    debug!("loaded additional config from {:?}", cli_config_path);
                }
                None => {
                    // Unlike the user config, a missing --config file is an error.
                    return Err(ConfigError::ReadError {
                        path: cli_config_path.clone(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "specified config file not found",
                        ),
                    });
                }
            }
        }

        // Apply CLI flags (highest priority).
        if !cli.add_trusted_domains.is_empty() {
            config.merge(Config {
                catalog: CatalogConfig {
                    trusted_domains: cli.add_trusted_domains.clone(),
                },
                ..Default::default()
            });
            debug!(
                "added {} trusted domains from CLI flags",
                cli.add_trusted_domains.len()
            );
        }

        Ok(config)
    }

    /// Load a single config file, returning `None` if it does not exist.
    fn load_file(&self, path: &Path) -> Result<Option<Config>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["spark-audit"];
        full.extend(args);
        Cli::parse_from(full)
    }

    fn loader_without_user_config() -> ConfigLoader {
        ConfigLoader::with_user_path(PathBuf::from("/nonexistent/config.toml"))
    }

    #[test]
    fn test_embedded_defaults_loaded() {
        let config = loader_without_user_config().load(&cli(&[])).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config
            .catalog
            .trusted_domains
            .contains(&"*.notebook.windows.net".to_string()));
    }

    #[test]
    fn test_user_config_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[general]\nlog_level = \"debug\"\n\n[catalog]\ntrusted_domains = [\"mycorp.net\"]"
        )
        .unwrap();

        let loader = ConfigLoader::with_user_path(file.path().to_path_buf());
        let config = loader.load(&cli(&[])).unwrap();

        assert_eq!(config.general.log_level, "debug");
        // Defaults are kept, user entries appended.
        assert!(config
            .catalog
            .trusted_domains
            .contains(&"api.fabric.microsoft.com".to_string()));
        assert!(config.catalog.trusted_domains.contains(&"mycorp.net".to_string()));
    }

    #[test]
    fn test_cli_domains_appended() {
        let config = loader_without_user_config()
            .load(&cli(&["-d", "partner.example.com", "-d", "*.partner.example.com"]))
            .unwrap();

        assert!(config
            .catalog
            .trusted_domains
            .contains(&"partner.example.com".to_string()));
        assert!(config
            .catalog
            .trusted_domains
            .contains(&"*.partner.example.com".to_string()));
    }

    #[test]
    fn test_missing_cli_config_is_error() {
        let result = loader_without_user_config()
            .load(&cli(&["--config", "/nonexistent/extra.toml"]));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[[").unwrap();

        let loader = ConfigLoader::with_user_path(file.path().to_path_buf());
        assert!(matches!(
            loader.load(&cli(&[])),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
