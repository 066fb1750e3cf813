//! Configuration model definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::confidence::{ConfidenceWeights, TierThresholds};

/// Main configuration structure for the knowledge base subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KbConfig {
    /// Retrieval engine configuration
    pub search: SearchConfig,

    /// Confidence model configuration
    pub confidence: ConfidenceConfig,

    /// Learning pipeline configuration
    pub learning: LearningConfig,

    /// Auto-update scheduler configuration
    pub scheduler: SchedulerConfig,

    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Retrieval engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Weight of the semantic score in hybrid fusion
    pub semantic_weight: f32,

    /// Weight of the keyword score in hybrid fusion
    pub keyword_weight: f32,

    /// Default confidence floor for candidate articles
    pub min_confidence: f32,

    /// Default result limit
    pub default_limit: usize,

    /// How many history entries contextual search folds into the query
    pub context_window: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.7,
            keyword_weight: 0.3,
            min_confidence: 0.6,
            default_limit: 5,
            context_window: 3,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("semantic_weight", self.semantic_weight),
            ("keyword_weight", self.keyword_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1], got {}", name, value));
            }
        }
        let sum = self.semantic_weight + self.keyword_weight;
        if (sum - 1.0).abs() > 1e-4 {
            return Err(format!("search weights must sum to 1.0, got {}", sum));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }
        if self.default_limit == 0 {
            return Err("default_limit must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Confidence model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Component weights; must sum to 1.0
    pub weights: ConfidenceWeights,

    /// Quality tier thresholds; must be strictly descending
    pub tiers: TierThresholds,
}

impl ConfidenceConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate()?;
        self.tiers.validate()?;
        Ok(())
    }
}

/// Learning pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LearningConfig {
    /// Occurrence count at which an unresolved issue becomes advisory
    pub recurring_threshold: u32,

    /// How many leading question characters the refinement similarity
    /// lookup matches on
    pub refinement_prefix_len: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            recurring_threshold: 3,
            refinement_prefix_len: 50,
        }
    }
}

impl LearningConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.recurring_threshold == 0 {
            return Err("recurring_threshold must be greater than 0".to_string());
        }
        if self.refinement_prefix_len == 0 {
            return Err("refinement_prefix_len must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Auto-update scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How far back a batch run replays learning edits
    #[serde(with = "humantime_serde")]
    pub lookback: Duration,

    /// Token-set similarity above which two articles count as duplicates
    pub duplicate_similarity_threshold: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(24 * 60 * 60),
            duplicate_similarity_threshold: 0.85,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.lookback.is_zero() {
            return Err("scheduler lookback must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.duplicate_similarity_threshold) {
            return Err(format!(
                "duplicate_similarity_threshold must be in [0, 1], got {}",
                self.duplicate_similarity_threshold
            ));
        }
        Ok(())
    }
}

/// Embedding service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embeddings endpoint (OpenAI-compatible)
    pub endpoint: String,

    /// Model name sent with every request
    pub model: String,

    /// Bearer token, if the service requires one
    pub api_key: Option<String>,

    /// Expected vector dimension; mismatched responses are rejected
    pub dimension: usize,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Delay between requests during batch backfill
    #[serde(with = "humantime_serde")]
    pub backfill_delay: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            dimension: 1536,
            request_timeout: Duration::from_secs(30),
            backfill_delay: Duration::from_millis(100),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("embedding endpoint cannot be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("embedding model name cannot be empty".to_string());
        }
        if self.dimension == 0 {
            return Err("embedding dimension must be greater than 0".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("embedding request_timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,

    /// Log format
    pub format: LogFormat,

    /// File to log to (if any)
    pub file: Option<PathBuf>,

    /// Whether to log to stdout
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Default,
            file: None,
            stdout: true,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default format
    Default,

    /// JSON format
    Json,

    /// Compact format
    Compact,

    /// Pretty format
    Pretty,
}
