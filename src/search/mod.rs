//! Retrieval engine: semantic, keyword, hybrid, and contextual search.
//!
//! Semantic relevance is the primary signal; keyword matching is a
//! tie-breaker and fallback. Hybrid fusion weights the two asymmetrically,
//! and an article found by only one side keeps only that side's weighted
//! score.
//!
//! Every entry point emits duration, result count, and top-result confidence
//! through tracing, on success and on failure alike.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::models::{Article, ArticleCategory};
use crate::storage::{ArticleFilter, ArticleStore, KbStore};
use crate::{KbError, Result};

/// Filter options accepted by every search entry point
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub category: Option<ArticleCategory>,
    /// Confidence floor; falls back to the configured default
    pub min_confidence: Option<f32>,
    /// Result cap; falls back to the configured default
    pub limit: Option<usize>,
    pub include_archived: bool,
}

impl SearchOptions {
    pub fn with_category(mut self, category: ArticleCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }
}

/// One ranked search hit
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub article: Article,
    /// Raw relevance: cosine similarity or normalized keyword match count
    pub relevance_score: f32,
    /// Relevance blended with article confidence (and fusion weights for
    /// hybrid results)
    pub combined_score: f32,
}

/// Hybrid retrieval over an article store and an embedding provider
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn KbStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: SearchConfig,
    /// Inter-request delay during embedding backfill
    backfill_delay: Duration,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn KbStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: SearchConfig,
        backfill_delay: Duration,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
            backfill_delay,
        }
    }

    fn limit(&self, options: &SearchOptions) -> usize {
        options.limit.unwrap_or(self.config.default_limit)
    }

    fn candidate_filter(&self, options: &SearchOptions) -> ArticleFilter {
        let mut filter = ArticleFilter::default()
            .with_min_confidence(options.min_confidence.unwrap_or(self.config.min_confidence));
        if let Some(category) = options.category {
            filter = filter.with_category(category);
        }
        filter.include_archived = options.include_archived;
        filter
    }

    fn validate_query(query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(KbError::Validation(
                "search query must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn record_search(kind: &str, start: Instant, outcome: &Result<Vec<SearchResult>>) {
        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(results) => {
                let top_confidence = results.first().map(|r| r.article.confidence_score);
                debug!(
                    search_type = kind,
                    duration_ms,
                    result_count = results.len(),
                    top_confidence,
                    "search completed"
                );
            }
            Err(error) => {
                warn!(search_type = kind, duration_ms, %error, "search failed");
            }
        }
    }

    /// Rank candidates by cosine similarity against the query embedding.
    ///
    /// Articles without a stored embedding score zero. An embedding-service
    /// failure propagates; the caller decides whether to degrade.
    pub async fn semantic_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let outcome = self.semantic_search_inner(query, options).await;
        Self::record_search("semantic", start, &outcome);
        outcome
    }

    async fn semantic_search_inner(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        Self::validate_query(query)?;
        let query_embedding = self.embedder.embed(query).await?;
        let candidates = self
            .store
            .list_articles(self.candidate_filter(options), None)
            .await?;

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .map(|article| {
                let similarity = article
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(&query_embedding, e))
                    .unwrap_or(0.0);
                let combined_score = similarity * article.confidence_score;
                SearchResult {
                    article,
                    relevance_score: similarity,
                    combined_score,
                }
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(self.limit(options));
        Ok(results)
    }

    /// Rank candidates by how many query tokens appear as substrings of
    /// the article's question, answer, or tags. Zero-match candidates are
    /// dropped.
    pub async fn keyword_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let outcome = self.keyword_search_inner(query, options).await;
        Self::record_search("keyword", start, &outcome);
        outcome
    }

    async fn keyword_search_inner(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        Self::validate_query(query)?;
        let lowered = query.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let candidates = self
            .store
            .list_articles(self.candidate_filter(options), None)
            .await?;

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|article| {
                let text = article.searchable_text();
                let matches = tokens.iter().filter(|t| text.contains(**t)).count();
                if matches == 0 {
                    return None;
                }
                let relevance = matches as f32 / tokens.len() as f32;
                let combined_score = relevance * article.confidence_score;
                Some(SearchResult {
                    article,
                    relevance_score: relevance,
                    combined_score,
                })
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(self.limit(options));
        Ok(results)
    }

    /// Run both searches and fuse the rankings.
    ///
    /// An article in both lists gets `semantic×w_s + keyword×w_k`; one found
    /// by a single side keeps that side's score scaled by its own weight.
    pub async fn hybrid_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let outcome = self.hybrid_search_inner(query, options).await;
        Self::record_search("hybrid", start, &outcome);
        outcome
    }

    async fn hybrid_search_inner(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let semantic = self.semantic_search(query, options).await?;
        let keyword = self.keyword_search(query, options).await?;

        let mut merged: Vec<SearchResult> = Vec::with_capacity(semantic.len() + keyword.len());
        for mut result in semantic {
            result.combined_score *= self.config.semantic_weight;
            merged.push(result);
        }
        for mut result in keyword {
            if let Some(existing) = merged.iter_mut().find(|r| r.article.id == result.article.id)
            {
                existing.combined_score += result.combined_score * self.config.keyword_weight;
            } else {
                result.combined_score *= self.config.keyword_weight;
                merged.push(result);
            }
        }

        sort_by_score(&mut merged);
        merged.truncate(self.limit(options));
        Ok(merged)
    }

    /// Hybrid search over the query augmented with recent conversation
    /// history (chronological order, query last).
    pub async fn contextual_search(
        &self,
        query: &str,
        history: &[String],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let outcome = self.contextual_search_inner(query, history, options).await;
        Self::record_search("contextual", start, &outcome);
        outcome
    }

    async fn contextual_search_inner(
        &self,
        query: &str,
        history: &[String],
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        Self::validate_query(query)?;
        let window = self.config.context_window;
        let tail_start = history.len().saturating_sub(window);
        let mut parts: Vec<&str> = history[tail_start..].iter().map(String::as_str).collect();
        parts.push(query);
        self.hybrid_search_inner(&parts.join(" "), options).await
    }

    /// Articles in the same category ranked by embedding similarity to the
    /// given one. Empty if the source article has no embedding.
    pub async fn related_articles(
        &self,
        article_id: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or_else(|| KbError::NotFound(format!("article {}", article_id)))?;

        let Some(embedding) = article.embedding.as_deref() else {
            return Ok(Vec::new());
        };

        let peers = self
            .store
            .list_articles(ArticleFilter::active().with_category(article.category), None)
            .await?;

        let mut results: Vec<SearchResult> = peers
            .into_iter()
            .filter(|peer| peer.id != article_id)
            .map(|peer| {
                let similarity = peer
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(embedding, e))
                    .unwrap_or(0.0);
                let combined_score = similarity * peer.confidence_score;
                SearchResult {
                    article: peer,
                    relevance_score: similarity,
                    combined_score,
                }
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    /// Regenerate one article's embedding from its current question and
    /// answer text.
    pub async fn refresh_embedding(&self, article_id: &str) -> Result<Article> {
        let mut article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or_else(|| KbError::NotFound(format!("article {}", article_id)))?;

        let text = format!("{} {}", article.question, article.answer);
        article.embedding = Some(self.embedder.embed(&text).await?);
        article.updated_at = Utc::now();

        let updated = self.store.update_article(article).await?;
        debug!(article_id = %updated.id, "refreshed article embedding");
        Ok(updated)
    }

    /// Embed every active article that has no embedding yet.
    ///
    /// Failures are logged and skipped so one bad article cannot stall the
    /// batch; a configurable delay between requests rate-limits the
    /// embedding service. Returns the number updated.
    pub async fn backfill_embeddings(&self) -> Result<usize> {
        let pending = self
            .store
            .list_articles(
                ArticleFilter {
                    missing_embedding: true,
                    ..ArticleFilter::active()
                },
                None,
            )
            .await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut updated = 0;
        for article in &pending {
            match self.refresh_embedding(&article.id).await {
                Ok(_) => updated += 1,
                Err(error) => {
                    warn!(article_id = %article.id, %error, "embedding backfill failed for article");
                }
            }
            if !self.backfill_delay.is_zero() {
                tokio::time::sleep(self.backfill_delay).await;
            }
        }

        debug!(updated, total = pending.len(), "embedding backfill finished");
        Ok(updated)
    }
}

fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.article.id.cmp(&b.article.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::storage::InMemoryKbStore;

    fn engine(store: Arc<InMemoryKbStore>) -> SearchEngine {
        SearchEngine::new(
            store,
            Arc::new(HashingEmbedder::new(128)),
            SearchConfig::default(),
            Duration::ZERO,
        )
    }

    async fn seed(store: &InMemoryKbStore, question: &str, answer: &str, confidence: f32) -> String {
        let article = Article::builder(question, answer)
            .category(ArticleCategory::Orders)
            .confidence(confidence)
            .build();
        let id = article.id.clone();
        store.create_article(article).await.unwrap();
        id
    }

    #[tokio::test]
    async fn semantic_search_ranks_by_similarity_and_confidence() {
        let store = Arc::new(InMemoryKbStore::new());
        let on_topic = seed(&store, "where is my order", "track it online", 0.9).await;
        seed(&store, "what is your return policy", "thirty days", 0.9).await;
        let engine = engine(store.clone());
        engine.backfill_embeddings().await.unwrap();

        let results = engine
            .semantic_search("where is my order", &SearchOptions::default())
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].article.id, on_topic);
        assert!(results[0].combined_score <= results[0].relevance_score);
    }

    #[tokio::test]
    async fn keyword_search_drops_non_matching_articles() {
        let store = Arc::new(InMemoryKbStore::new());
        seed(&store, "where is my order", "track it online", 0.9).await;
        seed(&store, "warranty coverage", "two years", 0.9).await;
        let engine = engine(store);

        let results = engine
            .keyword_search("order tracking", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].article.question.contains("order"));
        // one of two tokens matched ("tracking" is not a substring of "track it")
        assert!((results[0].relevance_score - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn hybrid_results_are_subset_of_union_and_sorted() {
        let store = Arc::new(InMemoryKbStore::new());
        seed(&store, "where is my order", "track it online", 0.9).await;
        seed(&store, "cancel my order", "within one hour", 0.8).await;
        seed(&store, "warranty coverage", "two years", 0.7).await;
        let engine = engine(store);
        engine.backfill_embeddings().await.unwrap();

        let options = SearchOptions::default();
        let semantic = engine.semantic_search("order status", &options).await.unwrap();
        let keyword = engine.keyword_search("order status", &options).await.unwrap();
        let hybrid = engine.hybrid_search("order status", &options).await.unwrap();

        let union: Vec<&str> = semantic
            .iter()
            .chain(keyword.iter())
            .map(|r| r.article.id.as_str())
            .collect();
        for result in &hybrid {
            assert!(union.contains(&result.article.id.as_str()));
        }
        for pair in hybrid.windows(2) {
            assert!(pair[0].combined_score >= pair[1].combined_score);
        }
    }

    #[tokio::test]
    async fn confidence_floor_and_archived_are_enforced() {
        let store = Arc::new(InMemoryKbStore::new());
        seed(&store, "order question", "low confidence answer", 0.3).await;
        let mut archived = Article::builder("order question", "archived answer")
            .category(ArticleCategory::Orders)
            .confidence(0.9)
            .build();
        archived.archived_at = Some(Utc::now());
        store.create_article(archived).await.unwrap();
        let engine = engine(store);

        let results = engine
            .keyword_search("order", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());

        let results = engine
            .keyword_search(
                "order",
                &SearchOptions::default()
                    .with_min_confidence(0.0)
                    .include_archived(),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let store = Arc::new(InMemoryKbStore::new());
        let engine = engine(store);
        for query in ["", "   "] {
            assert!(matches!(
                engine.keyword_search(query, &SearchOptions::default()).await,
                Err(KbError::Validation(_))
            ));
            assert!(matches!(
                engine.semantic_search(query, &SearchOptions::default()).await,
                Err(KbError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn contextual_search_uses_recent_history() {
        let store = Arc::new(InMemoryKbStore::new());
        seed(&store, "how do I return an item", "use the returns portal", 0.9).await;
        let engine = engine(store);
        engine.backfill_embeddings().await.unwrap();

        let history = vec![
            "hello".to_string(),
            "I bought a jacket".to_string(),
            "I want to return an item".to_string(),
        ];
        let results = engine
            .contextual_search("how does that work", &history, &SearchOptions::default())
            .await
            .unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn related_articles_stay_in_category_and_exclude_self() {
        let store = Arc::new(InMemoryKbStore::new());
        let source = seed(&store, "where is my order", "track it online", 0.9).await;
        let sibling = seed(&store, "order status updates", "emailed daily", 0.9).await;
        let other = Article::builder("return policy", "thirty days")
            .category(ArticleCategory::Returns)
            .confidence(0.9)
            .build();
        store.create_article(other).await.unwrap();
        let engine = engine(store);
        engine.backfill_embeddings().await.unwrap();

        let related = engine.related_articles(&source, 5).await.unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].article.id, sibling);
    }

    #[tokio::test]
    async fn related_articles_without_embedding_is_empty() {
        let store = Arc::new(InMemoryKbStore::new());
        let id = seed(&store, "q", "a", 0.9).await;
        let engine = engine(store);
        assert!(engine.related_articles(&id, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backfill_counts_and_skips_completed() {
        let store = Arc::new(InMemoryKbStore::new());
        seed(&store, "q1", "a1", 0.9).await;
        seed(&store, "q2", "a2", 0.9).await;
        let engine = engine(store);

        assert_eq!(engine.backfill_embeddings().await.unwrap(), 2);
        assert_eq!(engine.backfill_embeddings().await.unwrap(), 0);
    }
}
