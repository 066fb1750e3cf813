//! # SupportKB
//!
//! Knowledge base retrieval and learning subsystem for automated customer
//! support agents. Provides hybrid lexical/semantic retrieval, a
//! multi-factor confidence model, a learning pipeline that turns human
//! edits of AI drafts into new knowledge, a privacy scrubbing gate, and
//! batch maintenance jobs.
//!
//! ## Quick Start
//!
//! ```rust
//! use supportkb::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = Arc::new(InMemoryKbStore::new());
//!     let embedder = Arc::new(HashingEmbedder::new(256));
//!     let config = ConfigBuilder::new().build()?;
//!
//!     let kb = init(config, store, embedder)?;
//!
//!     // Retrieval fuses embedding similarity with keyword overlap
//!     let results = kb
//!         .search()
//!         .hybrid_search("where is my order", &SearchOptions::default())
//!         .await?;
//!     assert!(results.is_empty());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## BYOE (Bring Your Own Embeddings)
//!
//! The embedding provider is an injected trait object. Ship the bundled
//! [`embedding::RemoteEmbeddingClient`] against any OpenAI-compatible
//! `/v1/embeddings` endpoint, use the deterministic
//! [`embedding::HashingEmbedder`] for tests, or implement
//! [`embedding::EmbeddingProvider`] for anything else.
//!
//! ## Architecture
//!
//! - **Retrieval**: semantic, keyword, hybrid, and contextual search
//! - **Confidence**: weighted reliability scores, quality tiers, sweeps
//! - **Learning**: edit-distance analysis of human-reviewed drafts
//! - **Privacy**: PII redaction on every persistence path
//! - **Scheduler**: batch replay, stale flagging, duplicate merge

pub mod agent;
pub mod confidence;
pub mod config;
pub mod core;
pub mod embedding;
pub mod learning;
pub mod logging;
pub mod models;
pub mod privacy;
pub mod scheduler;
pub mod search;
pub mod storage;

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::agent::{AgentToolkit, KbSearchResponse, TrackUsageOutcome};
    pub use crate::confidence::{ConfidenceModel, ConfidenceTracker, QualityTier, ReviewFlag};
    pub use crate::config::{ConfigBuilder, ConfigLoader, KbConfig, LogFormat, LogLevel};
    pub use crate::core::KnowledgeManager;
    pub use crate::embedding::{EmbeddingProvider, HashingEmbedder, RemoteEmbeddingClient};
    pub use crate::learning::{LearningInput, LearningOutcome, LearningPipeline};
    pub use crate::models::{
        Article, ArticleBuilder, ArticleCategory, ArticleSource, GradeSet, LearningEdit,
        LearningType, RecurringIssue, UsageLog,
    };
    pub use crate::privacy::{ScrubResult, Scrubber};
    pub use crate::scheduler::{AutoUpdater, UpdateTrigger};
    pub use crate::search::{SearchEngine, SearchOptions, SearchResult};
    pub use crate::storage::{InMemoryKbStore, KbStore, StorageError};

    pub use crate::{init, KbError, Result};
}

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for knowledge base operations with recovery suggestions
#[derive(Debug, thiserror::Error)]
pub enum KbError {
    /// Configuration invariant violated
    #[error("Configuration error: {0}. Fix the configuration and restart; invalid values are rejected at startup, never coerced")]
    Config(String),

    /// Error during storage operations
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Error talking to the embedding service
    #[error("Embedding error: {0}. Semantic search is unavailable until the embedding service recovers; keyword search still works")]
    Embedding(#[from] embedding::EmbeddingError),

    /// Logging setup error
    #[error("Logging error: {0}")]
    Logging(#[from] logging::LogError),

    /// Malformed input rejected at the call boundary
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced article or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Content failed the privacy gate
    #[error("Privacy error: {0}. The content was not persisted")]
    Privacy(String),
}

impl From<config::ConfigError> for KbError {
    fn from(err: config::ConfigError) -> Self {
        KbError::Config(err.to_string())
    }
}

/// Result type for knowledge base operations
pub type Result<T> = std::result::Result<T, KbError>;

/// Initialize the knowledge base with the provided configuration and
/// injected dependencies.
///
/// Sets up logging (an already-initialized global subscriber is tolerated),
/// validates the configuration, and wires every subsystem to the given
/// store and embedding provider.
pub fn init(
    config: config::KbConfig,
    store: std::sync::Arc<dyn storage::KbStore>,
    embedder: std::sync::Arc<dyn embedding::EmbeddingProvider>,
) -> Result<core::KnowledgeManager> {
    // Logging failures never block initialization
    let _ = logging::init(&config.logging);

    core::KnowledgeManager::new(store, embedder, config)
}
