//! Top-level service object wiring every subsystem to one store and one
//! embedding provider.
//!
//! Constructed once at startup and passed everywhere; the manager owns no
//! background tasks, so dropping it is always safe.

use std::sync::Arc;

use tracing::info;

use crate::agent::AgentToolkit;
use crate::confidence::{ConfidenceModel, ConfidenceTracker};
use crate::config::{validation, KbConfig};
use crate::embedding::EmbeddingProvider;
use crate::learning::LearningPipeline;
use crate::privacy::Scrubber;
use crate::scheduler::AutoUpdater;
use crate::search::SearchEngine;
use crate::storage::KbStore;
use crate::{KbError, Result};

/// Facade over the retrieval, confidence, learning, and maintenance
/// subsystems.
#[derive(Clone)]
pub struct KnowledgeManager {
    store: Arc<dyn KbStore>,
    config: KbConfig,
    search: SearchEngine,
    confidence: ConfidenceTracker,
    learning: LearningPipeline,
    updater: AutoUpdater,
    toolkit: AgentToolkit,
}

impl KnowledgeManager {
    /// Wire up all subsystems from injected dependencies.
    ///
    /// Configuration invariants (fusion weights summing to 1.0, tier
    /// thresholds strictly descending) are validated here and fail loudly.
    pub fn new(
        store: Arc<dyn KbStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: KbConfig,
    ) -> Result<Self> {
        validation::validate_config(&config)?;

        let model = ConfidenceModel::new(config.confidence.weights, config.confidence.tiers)
            .map_err(KbError::Config)?;

        let search = SearchEngine::new(
            store.clone(),
            embedder,
            config.search.clone(),
            config.embedding.backfill_delay,
        );
        let confidence = ConfidenceTracker::new(store.clone(), model);
        let learning = LearningPipeline::new(
            store.clone(),
            Scrubber::new(),
            model,
            config.learning.clone(),
        );
        let updater = AutoUpdater::new(store.clone(), confidence.clone(), config.scheduler.clone());
        let toolkit = AgentToolkit::new(search.clone(), store.clone(), confidence.clone());

        info!(
            embedding_model = %config.embedding.model,
            min_confidence = config.search.min_confidence,
            "knowledge manager initialized"
        );

        Ok(Self {
            store,
            config,
            search,
            confidence,
            learning,
            updater,
            toolkit,
        })
    }

    /// Retrieval engine: semantic, keyword, hybrid, contextual search.
    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    /// Confidence tracking, archival, and review flagging.
    pub fn confidence(&self) -> &ConfidenceTracker {
        &self.confidence
    }

    /// Learning extraction from human-reviewed drafts.
    pub fn learning(&self) -> &LearningPipeline {
        &self.learning
    }

    /// Batch maintenance: learning replay, stale sweep, duplicate merge.
    pub fn updater(&self) -> &AutoUpdater {
        &self.updater
    }

    /// Agent-facing tool surface.
    pub fn toolkit(&self) -> &AgentToolkit {
        &self.toolkit
    }

    /// Underlying article store.
    pub fn store(&self) -> &Arc<dyn KbStore> {
        &self.store
    }

    pub fn config(&self) -> &KbConfig {
        &self.config
    }
}
