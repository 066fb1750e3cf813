//! Integration tests for the retrieval engine and agent tool facade
//!
//! These tests verify the complete search workflow including:
//! - Hybrid fusion of semantic and keyword signals
//! - Confidence floor, category, and archived filtering
//! - Contextual search over conversation history
//! - Graceful degradation when the embedding service fails

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use supportkb::agent::AgentToolkit;
use supportkb::confidence::{ConfidenceModel, ConfidenceTracker};
use supportkb::config::SearchConfig;
use supportkb::embedding::{self, EmbeddingError, EmbeddingProvider, HashingEmbedder};
use supportkb::models::{Article, ArticleCategory};
use supportkb::search::{SearchEngine, SearchOptions};
use supportkb::storage::{ArticleFilter, ArticleStore, InMemoryKbStore};

async fn seeded_engine() -> (Arc<InMemoryKbStore>, SearchEngine) {
    let store = Arc::new(InMemoryKbStore::new());
    let embedder = Arc::new(HashingEmbedder::new(128));

    let articles = vec![
        Article::builder(
            "Where is my order?",
            "You can track your order from the tracking page in your account.",
        )
        .category(ArticleCategory::Orders)
        .tag("order-status")
        .confidence(0.9)
        .build(),
        Article::builder(
            "How long does shipping take?",
            "Standard shipping takes three to five business days.",
        )
        .category(ArticleCategory::Shipping)
        .tag("shipping-time")
        .confidence(0.8)
        .build(),
        Article::builder(
            "What is your return policy?",
            "Returns are accepted within 30 days of delivery.",
        )
        .category(ArticleCategory::Returns)
        .tag("returns")
        .confidence(0.75)
        .build(),
        Article::builder("How do I reset my password?", "Use the forgot password link.")
            .category(ArticleCategory::Technical)
            .confidence(0.3)
            .build(),
    ];
    for article in articles {
        store
            .create_article(article)
            .await
            .expect("Should create article");
    }

    let engine = SearchEngine::new(
        store.clone(),
        embedder,
        SearchConfig::default(),
        Duration::ZERO,
    );
    let count = engine
        .backfill_embeddings()
        .await
        .expect("Should backfill embeddings");
    assert_eq!(count, 4);

    (store, engine)
}

#[tokio::test]
async fn hybrid_results_are_a_subset_of_both_searches() {
    let (_store, engine) = seeded_engine().await;
    let options = SearchOptions::default().with_min_confidence(0.0).with_limit(10);
    let query = "how long does order shipping take";

    let semantic = engine
        .semantic_search(query, &options)
        .await
        .expect("Should run semantic search");
    let keyword = engine
        .keyword_search(query, &options)
        .await
        .expect("Should run keyword search");
    let hybrid = engine
        .hybrid_search(query, &options)
        .await
        .expect("Should run hybrid search");

    let union: HashSet<String> = semantic
        .iter()
        .chain(keyword.iter())
        .map(|r| r.article.id.clone())
        .collect();
    for result in &hybrid {
        assert!(union.contains(&result.article.id));
    }

    for pair in hybrid.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }
}

#[tokio::test]
async fn confidence_floor_applies_by_default() {
    let (_store, engine) = seeded_engine().await;

    let results = engine
        .keyword_search("password reset", &SearchOptions::default())
        .await
        .expect("Should search");
    assert!(results.iter().all(|r| r.article.confidence_score >= 0.6));

    let relaxed = engine
        .keyword_search(
            "password reset",
            &SearchOptions::default().with_min_confidence(0.0),
        )
        .await
        .expect("Should search");
    assert!(relaxed
        .iter()
        .any(|r| r.article.question.contains("password")));
}

#[tokio::test]
async fn category_filter_restricts_results() {
    let (_store, engine) = seeded_engine().await;
    let options = SearchOptions::default()
        .with_category(ArticleCategory::Shipping)
        .with_min_confidence(0.0);

    let results = engine
        .hybrid_search("shipping order returns", &options)
        .await
        .expect("Should search");
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|r| r.article.category == ArticleCategory::Shipping));
}

#[tokio::test]
async fn archived_articles_are_excluded_unless_requested() {
    let (store, engine) = seeded_engine().await;

    let articles = store
        .list_articles(ArticleFilter::active(), None)
        .await
        .expect("Should list");
    let mut target = articles
        .into_iter()
        .find(|a| a.question.contains("return policy"))
        .expect("Should find the returns article");
    target.archived_at = Some(chrono::Utc::now());
    store
        .update_article(target.clone())
        .await
        .expect("Should archive");

    let hidden = engine
        .keyword_search("return policy", &SearchOptions::default())
        .await
        .expect("Should search");
    assert!(hidden.iter().all(|r| r.article.id != target.id));

    let shown = engine
        .keyword_search("return policy", &SearchOptions::default().include_archived())
        .await
        .expect("Should search");
    assert!(shown.iter().any(|r| r.article.id == target.id));
}

#[tokio::test]
async fn contextual_search_uses_recent_history() {
    let (_store, engine) = seeded_engine().await;
    let history = vec![
        "hi there".to_string(),
        "I placed an order last week".to_string(),
        "it has not arrived".to_string(),
    ];

    let results = engine
        .contextual_search("what should I do", &history, &SearchOptions::default())
        .await
        .expect("Should search");
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .any(|r| r.article.category == ArticleCategory::Orders));
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let (_store, engine) = seeded_engine().await;
    assert!(engine
        .hybrid_search("   ", &SearchOptions::default())
        .await
        .is_err());
}

mockall::mock! {
    pub Embedder {}

    impl std::fmt::Debug for Embedder {
        fn fmt<'a>(&self, f: &mut std::fmt::Formatter<'a>) -> std::fmt::Result;
    }

    #[async_trait]
    impl EmbeddingProvider for Embedder {
        fn dimension(&self) -> usize;
        async fn embed(&self, text: &str) -> embedding::Result<Vec<f32>>;
    }
}

/// Mock standing in for an unreachable embedding service.
fn unreachable_embedder() -> MockEmbedder {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(128usize);
    embedder
        .expect_embed()
        .returning(|_| Err(EmbeddingError::Request("connection refused".to_string())));
    embedder
}

#[tokio::test]
async fn embedding_failure_propagates_from_the_engine() {
    let store = Arc::new(InMemoryKbStore::new());
    store
        .create_article(
            Article::builder("Where is my order?", "Check the tracking page.")
                .confidence(0.9)
                .build(),
        )
        .await
        .expect("Should create article");

    let engine = SearchEngine::new(
        store.clone(),
        Arc::new(unreachable_embedder()),
        SearchConfig::default(),
        Duration::ZERO,
    );

    assert!(engine
        .hybrid_search("order", &SearchOptions::default())
        .await
        .is_err());

    // Keyword search does not touch the embedding service
    let results = engine
        .keyword_search("order", &SearchOptions::default())
        .await
        .expect("Keyword search should survive embedding outage");
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn facade_degrades_to_not_found_on_embedding_failure() {
    let store = Arc::new(InMemoryKbStore::new());
    store
        .create_article(
            Article::builder("Where is my order?", "Check the tracking page.")
                .confidence(0.9)
                .build(),
        )
        .await
        .expect("Should create article");

    let engine = SearchEngine::new(
        store.clone(),
        Arc::new(unreachable_embedder()),
        SearchConfig::default(),
        Duration::ZERO,
    );
    let tracker = ConfidenceTracker::new(store.clone(), ConfidenceModel::default());
    let toolkit = AgentToolkit::new(engine, store, tracker);

    let response = toolkit.search("order", &SearchOptions::default()).await;
    assert!(!response.found);
    assert!(response.results.is_empty());
}
