//! Configuration loading.
//!
//! Layered figment pipeline: compiled-in defaults, then an optional TOML
//! file, then `SUPPORTKB_`-prefixed environment variables. Later layers win
//! key by key, and the merged result is validated once on extraction.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use super::{models::KbConfig, validation, ConfigError, Result, DEFAULT_CONFIG_FILES, ENV_PREFIX};

/// Layered configuration pipeline, consumed by [`load`](Self::load).
#[derive(Debug)]
pub struct ConfigLoader {
    figment: Figment,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(KbConfig::default())),
        }
    }

    /// Layer a TOML file over the current state. A missing file is an error;
    /// use [`default_files`](Self::default_files) for optional lookup.
    pub fn file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileLoadError(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            figment: self.figment.merge(Toml::file(path)),
        })
    }

    /// Layer the first default-location file that exists, if any.
    pub fn default_files(self) -> Self {
        for name in DEFAULT_CONFIG_FILES {
            let path = Path::new(name);
            if path.exists() {
                return Self {
                    figment: self.figment.merge(Toml::file(path)),
                };
            }
        }
        self
    }

    /// Layer `SUPPORTKB_`-prefixed environment variables. `__` separates
    /// nesting levels, e.g. `SUPPORTKB_SEARCH__MIN_CONFIDENCE=0.5`.
    pub fn env(self) -> Self {
        Self {
            figment: self.figment.merge(Env::prefixed(ENV_PREFIX).split("__")),
        }
    }

    /// Extract and validate the merged configuration.
    pub fn load(self) -> Result<KbConfig> {
        let config: KbConfig = self
            .figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        validation::validate_config(&config)?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
