//! Configuration validation utilities.

use super::models::*;
use super::ConfigError;

/// Validate the entire configuration.
///
/// Invoked once at startup; individual sections are otherwise read as plain
/// fields without re-validation.
pub fn validate_config(config: &KbConfig) -> Result<(), ConfigError> {
    config
        .search
        .validate()
        .map_err(ConfigError::ValidationError)?;
    config
        .confidence
        .validate()
        .map_err(ConfigError::ValidationError)?;
    config
        .learning
        .validate()
        .map_err(ConfigError::ValidationError)?;
    config
        .scheduler
        .validate()
        .map_err(ConfigError::ValidationError)?;
    config
        .embedding
        .validate()
        .map_err(ConfigError::ValidationError)?;
    Ok(())
}
