//! Configuration system for the knowledge base.
//!
//! Typed configuration loaded from defaults, optional files, and environment
//! variables, validated once at startup. Business logic reads plain fields;
//! there is no runtime path lookup.

mod builder;
mod loader;
mod models;
pub mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;

/// Default configuration file names that the loader will look for
pub const DEFAULT_CONFIG_FILES: &[&str] = &["supportkb.toml", ".supportkb/config.toml"];

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SUPPORTKB_";

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred during file loading
    #[error("Failed to load configuration file: {0}")]
    FileLoadError(String),

    /// Error occurred during validation
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Error occurred during parsing
    #[error("Configuration parsing error: {0}")]
    ParseError(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
