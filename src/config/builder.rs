//! Configuration builder.
//!
//! Builder pattern API for constructing validated configurations in code.

use std::time::Duration;

use super::{models::*, validation, Result};

/// Builder for creating [`KbConfig`] instances.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: KbConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: KbConfig::default(),
        }
    }

    /// Set the hybrid fusion weights. They must sum to 1.0.
    pub fn with_search_weights(mut self, semantic: f32, keyword: f32) -> Self {
        self.config.search.semantic_weight = semantic;
        self.config.search.keyword_weight = keyword;
        self
    }

    /// Set the default confidence floor for retrieval.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.config.search.min_confidence = min_confidence;
        self
    }

    /// Set the default search result limit.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.config.search.default_limit = limit;
        self
    }

    /// Set the embedding service endpoint.
    pub fn with_embedding_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.embedding.endpoint = endpoint.into();
        self
    }

    /// Set the embedding model name.
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding.model = model.into();
        self
    }

    /// Set the embedding service API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.embedding.api_key = Some(api_key.into());
        self
    }

    /// Set the expected embedding dimension.
    pub fn with_embedding_dimension(mut self, dimension: usize) -> Self {
        self.config.embedding.dimension = dimension;
        self
    }

    /// Set the recurring issue advisory threshold.
    pub fn with_recurring_threshold(mut self, threshold: u32) -> Self {
        self.config.learning.recurring_threshold = threshold;
        self
    }

    /// Set how far back batch runs replay learning edits.
    pub fn with_scheduler_lookback(mut self, lookback: Duration) -> Self {
        self.config.scheduler.lookback = lookback;
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set the log format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Preset for tests: quiet logging, no backfill delay.
    pub fn testing() -> Self {
        let mut builder = Self::new();
        builder.config.logging.level = LogLevel::Warn;
        builder.config.embedding.backfill_delay = Duration::ZERO;
        builder
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<KbConfig> {
        validation::validate_config(&self.config)?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
