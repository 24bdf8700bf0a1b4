//! Configuration management: schema, hierarchy loading, and errors.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AnalysisConfig, CatalogConfig, Config, GeneralConfig};
