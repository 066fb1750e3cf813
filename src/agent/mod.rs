//! Tool facade consumed by the conversational agent.
//!
//! The agent must always get an answer shape it can act on, so every
//! operation here degrades gracefully: internal failures are logged and
//! surface as `found: false` with an empty result list, never as an error
//! the agent has to handle mid-conversation.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::confidence::ConfidenceTracker;
use crate::models::UsageLog;
use crate::search::{SearchEngine, SearchOptions, SearchResult};
use crate::storage::{KbStore, LearningStore};

/// Response returned to the agent for every search-style call
#[derive(Debug, Clone, Serialize)]
pub struct KbSearchResponse {
    /// False when nothing matched or retrieval failed internally
    pub found: bool,
    pub results: Vec<SearchResult>,
}

impl KbSearchResponse {
    fn empty() -> Self {
        Self {
            found: false,
            results: Vec::new(),
        }
    }

    fn from_results(results: Vec<SearchResult>) -> Self {
        Self {
            found: !results.is_empty(),
            results,
        }
    }
}

/// Outcome of a usage-tracking call
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrackUsageOutcome {
    /// True only if every log entry was appended
    pub success: bool,
    pub recorded: usize,
}

/// Agent-facing entry points over the retrieval engine and usage log
#[derive(Clone)]
pub struct AgentToolkit {
    engine: SearchEngine,
    store: Arc<dyn KbStore>,
    confidence: ConfidenceTracker,
}

impl AgentToolkit {
    pub fn new(
        engine: SearchEngine,
        store: Arc<dyn KbStore>,
        confidence: ConfidenceTracker,
    ) -> Self {
        Self {
            engine,
            store,
            confidence,
        }
    }

    /// Hybrid search that never errors toward the agent.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> KbSearchResponse {
        match self.engine.hybrid_search(query, options).await {
            Ok(results) => KbSearchResponse::from_results(results),
            Err(error) => {
                warn!(%error, "knowledge base search unavailable, returning no context");
                KbSearchResponse::empty()
            }
        }
    }

    /// Search with recent conversation history folded into the query.
    pub async fn search_with_context(
        &self,
        query: &str,
        history: &[String],
        options: &SearchOptions,
    ) -> KbSearchResponse {
        match self.engine.contextual_search(query, history, options).await {
            Ok(results) => KbSearchResponse::from_results(results),
            Err(error) => {
                warn!(%error, "contextual knowledge base search unavailable");
                KbSearchResponse::empty()
            }
        }
    }

    /// Articles related to one the agent already used.
    pub async fn related(&self, article_id: &str, limit: usize) -> KbSearchResponse {
        match self.engine.related_articles(article_id, limit).await {
            Ok(results) => KbSearchResponse::from_results(results),
            Err(error) => {
                warn!(%article_id, %error, "related article lookup failed");
                KbSearchResponse::empty()
            }
        }
    }

    /// Append one usage log entry per consumed article. A helpful/unhelpful
    /// signal also flows into the confidence tracker, updating the article's
    /// usage counters, `last_used_at`, and confidence score.
    ///
    /// Individual failures are logged and skipped so one bad entry does not
    /// drop the rest of the batch.
    pub async fn track_usage(
        &self,
        article_ids: &[String],
        approval_id: Option<String>,
        was_helpful: Option<bool>,
    ) -> TrackUsageOutcome {
        let mut recorded = 0;
        for article_id in article_ids {
            let log = UsageLog::new(article_id.clone(), approval_id.clone(), was_helpful);
            match self.store.append_usage(log).await {
                Ok(_) => recorded += 1,
                Err(error) => {
                    warn!(%article_id, %error, "failed to record article usage");
                }
            }
            if let Some(helpful) = was_helpful {
                if let Err(error) = self.confidence.update_confidence(article_id, helpful, None).await {
                    warn!(%article_id, %error, "failed to refresh article from usage signal");
                }
            }
        }
        debug!(
            recorded,
            requested = article_ids.len(),
            "tracked knowledge base usage"
        );
        TrackUsageOutcome {
            success: recorded == article_ids.len(),
            recorded,
        }
    }

    /// Render search results into the context block handed to the agent
    /// prompt. Deterministic for a given result list.
    pub fn format_context(&self, results: &[SearchResult]) -> String {
        if results.is_empty() {
            return "No relevant knowledge base articles found.".to_string();
        }

        let mut out = String::from("Relevant knowledge base articles:\n");
        for (index, result) in results.iter().enumerate() {
            let article = &result.article;
            out.push_str(&format!(
                "\n[{}] ({:.0}% confidence)\nQ: {}\nA: {}\n",
                index + 1,
                article.confidence_score * 100.0,
                article.question,
                article.answer,
            ));
            if !article.tags.is_empty() {
                out.push_str(&format!("Tags: {}\n", article.tags.join(", ")));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceModel;
    use crate::config::SearchConfig;
    use crate::embedding::HashingEmbedder;
    use crate::models::{Article, ArticleCategory};
    use crate::storage::{ArticleStore, InMemoryKbStore};
    use std::time::Duration;

    fn toolkit_for(store: Arc<InMemoryKbStore>) -> AgentToolkit {
        let engine = SearchEngine::new(
            store.clone(),
            Arc::new(HashingEmbedder::new(64)),
            SearchConfig::default(),
            Duration::ZERO,
        );
        let tracker = ConfidenceTracker::new(store.clone(), ConfidenceModel::default());
        AgentToolkit::new(engine, store, tracker)
    }

    async fn toolkit_with_articles() -> (Arc<InMemoryKbStore>, AgentToolkit) {
        let store = Arc::new(InMemoryKbStore::new());

        let article = Article::builder("where is my order", "check the tracking page")
            .category(ArticleCategory::Orders)
            .tags(vec!["order-status".to_string()])
            .confidence(0.85)
            .build();
        store.create_article(article).await.unwrap();

        let toolkit = toolkit_for(store.clone());
        (store, toolkit)
    }

    #[tokio::test]
    async fn search_reports_found() {
        let (_store, toolkit) = toolkit_with_articles().await;

        let response = toolkit
            .search("where is my order", &SearchOptions::default())
            .await;
        assert!(response.found);
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn invalid_query_degrades_to_not_found() {
        let (_store, toolkit) = toolkit_with_articles().await;

        let response = toolkit.search("   ", &SearchOptions::default()).await;
        assert!(!response.found);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn related_with_unknown_article_degrades() {
        let (_store, toolkit) = toolkit_with_articles().await;

        let response = toolkit.related("missing-id", 5).await;
        assert!(!response.found);
    }

    #[tokio::test]
    async fn track_usage_appends_per_article() {
        let (store, toolkit) = toolkit_with_articles().await;
        let articles = store
            .list_articles(crate::storage::ArticleFilter::active(), None)
            .await
            .unwrap();
        let ids: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();

        let outcome = toolkit
            .track_usage(&ids, Some("approval-1".to_string()), Some(true))
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.recorded, 1);
    }

    #[tokio::test]
    async fn helpful_signal_refreshes_article_statistics() {
        let (store, toolkit) = toolkit_with_articles().await;
        let articles = store
            .list_articles(crate::storage::ArticleFilter::active(), None)
            .await
            .unwrap();
        let article = &articles[0];
        assert_eq!(article.usage_count, 0);
        assert!(article.last_used_at.is_none());

        toolkit
            .track_usage(&[article.id.clone()], None, Some(true))
            .await;

        let used = store.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(used.usage_count, 1);
        assert_eq!(used.success_count, 1);
        assert!(used.last_used_at.is_some());
    }

    #[tokio::test]
    async fn usage_without_a_signal_leaves_counters_alone() {
        let (store, toolkit) = toolkit_with_articles().await;
        let articles = store
            .list_articles(crate::storage::ArticleFilter::active(), None)
            .await
            .unwrap();
        let article = &articles[0];

        let outcome = toolkit.track_usage(&[article.id.clone()], None, None).await;
        assert!(outcome.success);

        let untouched = store.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(untouched.usage_count, 0);
        assert!(untouched.last_used_at.is_none());
    }

    #[tokio::test]
    async fn format_context_renders_block() {
        let (_store, toolkit) = toolkit_with_articles().await;
        let response = toolkit
            .search("where is my order", &SearchOptions::default())
            .await;

        let block = toolkit.format_context(&response.results);
        assert!(block.starts_with("Relevant knowledge base articles:"));
        assert!(block.contains("(85% confidence)"));
        assert!(block.contains("Q: where is my order"));
        assert!(block.contains("A: check the tracking page"));
        assert!(block.contains("Tags: order-status"));
    }

    #[test]
    fn format_context_handles_empty() {
        let toolkit = toolkit_for(Arc::new(InMemoryKbStore::new()));
        assert_eq!(
            toolkit.format_context(&[]),
            "No relevant knowledge base articles found."
        );
    }
}
