//! Confidence model: article reliability scoring and quality sweeps.
//!
//! [`scoring`] holds the pure functions; [`ConfidenceTracker`] binds them to
//! a store and owns the single mutation path for usage, success, and grade
//! fields.

pub mod scoring;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

pub use scoring::{
    ConfidenceModel, ConfidenceWeights, QualityMetrics, QualityOverview, QualityTier, ReviewFlag,
    TierBar, TierThresholds,
};

use crate::models::{Article, GradeSet};
use crate::storage::{ArticleFilter, ArticleStore, KbStore};
use crate::{KbError, Result};

/// Applies confidence updates and quality sweeps against the store.
///
/// `update_confidence` is the only code path that mutates an article's
/// usage, success, or grade fields.
#[derive(Clone)]
pub struct ConfidenceTracker {
    store: Arc<dyn KbStore>,
    model: ConfidenceModel,
}

impl ConfidenceTracker {
    pub fn new(store: Arc<dyn KbStore>, model: ConfidenceModel) -> Self {
        Self { store, model }
    }

    pub fn model(&self) -> &ConfidenceModel {
        &self.model
    }

    /// Record one use of an article and recompute its confidence.
    ///
    /// Increments usage, optionally success, folds any supplied grades into
    /// the running averages with an incremental mean, then recomputes the
    /// weighted score and refreshes `last_used_at`.
    pub async fn update_confidence(
        &self,
        article_id: &str,
        was_successful: bool,
        grades: Option<GradeSet>,
    ) -> Result<Article> {
        let mut article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or_else(|| KbError::NotFound(format!("article {}", article_id)))?;

        if let Some(grades) = &grades {
            grades.validate().map_err(KbError::Validation)?;
        }

        if let Some(grades) = grades {
            // Incremental mean over the pre-increment usage count, floored
            // at 1 so the first grade is not divided away.
            let grade_count = article.usage_count.max(1) as f32;
            article.avg_tone_grade = Some(
                (article.avg_tone_grade.unwrap_or(0.0) * grade_count + grades.tone)
                    / (grade_count + 1.0),
            );
            article.avg_accuracy_grade = Some(
                (article.avg_accuracy_grade.unwrap_or(0.0) * grade_count + grades.accuracy)
                    / (grade_count + 1.0),
            );
            article.avg_policy_grade = Some(
                (article.avg_policy_grade.unwrap_or(0.0) * grade_count + grades.policy)
                    / (grade_count + 1.0),
            );
        }

        article.usage_count += 1;
        if was_successful {
            article.success_count += 1;
        }

        article.confidence_score = self.model.score_article(&article);
        let now = Utc::now();
        article.last_used_at = Some(now);
        article.updated_at = now;

        let updated = self.store.update_article(article).await?;
        debug!(
            article_id = %updated.id,
            confidence = updated.confidence_score,
            usage_count = updated.usage_count,
            "updated article confidence"
        );
        Ok(updated)
    }

    /// Archive articles unused for more than 90 days with confidence below
    /// 0.50. Returns the archived ids.
    pub async fn archive_stale(&self) -> Result<Vec<String>> {
        let now = Utc::now();
        let articles = self.store.list_articles(ArticleFilter::active(), None).await?;

        let mut archived = Vec::new();
        for mut article in articles {
            if article.days_since_last_use(now) > 90 && article.confidence_score < 0.50 {
                article.archived_at = Some(now);
                article.updated_at = now;
                let id = article.id.clone();
                self.store.update_article(article).await?;
                archived.push(id);
            }
        }

        if !archived.is_empty() {
            info!(count = archived.len(), "archived low-quality articles");
        }
        Ok(archived)
    }

    /// Collect review flags for articles that look unhealthy.
    ///
    /// An article can appear more than once if several conditions fire.
    pub async fn flag_for_review(&self) -> Result<Vec<ReviewFlag>> {
        let articles = self.store.list_articles(ArticleFilter::active(), None).await?;

        let mut flagged = Vec::new();
        for article in &articles {
            if article.confidence_score < 0.40 {
                flagged.push(ReviewFlag {
                    article_id: article.id.clone(),
                    reason: "Very low confidence score".to_string(),
                });
            }
            if matches!(article.avg_accuracy_grade, Some(avg) if avg < 3.0) {
                flagged.push(ReviewFlag {
                    article_id: article.id.clone(),
                    reason: "Low accuracy grades".to_string(),
                });
            }
            if article.success_rate() < 0.40 && article.usage_count >= 5 {
                flagged.push(ReviewFlag {
                    article_id: article.id.clone(),
                    reason: "High edit ratio - frequently requires corrections".to_string(),
                });
            }
        }
        Ok(flagged)
    }

    /// Full quality metrics for one article, including its usage relative
    /// to the category average.
    pub async fn quality_metrics(&self, article_id: &str) -> Result<QualityMetrics> {
        let article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or_else(|| KbError::NotFound(format!("article {}", article_id)))?;

        let peers = self
            .store
            .list_articles(ArticleFilter::active().with_category(article.category), None)
            .await?;
        let avg_category_usage = if peers.is_empty() {
            1.0
        } else {
            peers.iter().map(|a| a.usage_count as f32).sum::<f32>() / peers.len() as f32
        };
        let usage_rate = if avg_category_usage > 0.0 {
            article.usage_count as f32 / avg_category_usage
        } else {
            0.0
        };

        Ok(QualityMetrics {
            confidence_score: article.confidence_score,
            usage_rate,
            success_rate: article.success_rate(),
            avg_grades: GradeSet::new(
                article.avg_tone_grade.unwrap_or(0.0),
                article.avg_accuracy_grade.unwrap_or(0.0),
                article.avg_policy_grade.unwrap_or(0.0),
            ),
            quality_tier: self.model.tier_for_article(&article),
            recommendations: self.model.recommendations(&article, usage_rate, Utc::now()),
        })
    }

    /// System-wide quality summary across active articles.
    pub async fn quality_overview(&self) -> Result<QualityOverview> {
        let articles = self.store.list_articles(ArticleFilter::active(), None).await?;
        Ok(self.model.overview(&articles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleCategory;
    use crate::storage::InMemoryKbStore;

    fn tracker() -> (Arc<InMemoryKbStore>, ConfidenceTracker) {
        let store = Arc::new(InMemoryKbStore::new());
        let tracker = ConfidenceTracker::new(store.clone(), ConfidenceModel::default());
        (store, tracker)
    }

    #[tokio::test]
    async fn update_increments_counts_and_rescoring() {
        let (store, tracker) = tracker();
        let article = Article::builder("q", "a")
            .category(ArticleCategory::Orders)
            .confidence(0.5)
            .build();
        let id = article.id.clone();
        store.create_article(article).await.unwrap();

        let updated = tracker
            .update_confidence(&id, true, Some(GradeSet::new(5.0, 5.0, 5.0)))
            .await
            .unwrap();

        assert_eq!(updated.usage_count, 1);
        assert_eq!(updated.success_count, 1);
        assert!(updated.last_used_at.is_some());
        // first grade divides across the floored pre-increment count
        assert!((updated.avg_tone_grade.unwrap() - 2.5).abs() < 1e-5);
        // success 1.0 -> 0.4; grades 2.5/5 -> 0.5 across remaining weights
        assert!((updated.confidence_score - 0.7).abs() < 1e-5);
    }

    #[tokio::test]
    async fn unsuccessful_use_lowers_success_rate() {
        let (store, tracker) = tracker();
        let article = Article::builder("q", "a").usage(4, 4).build();
        let id = article.id.clone();
        store.create_article(article).await.unwrap();

        let updated = tracker.update_confidence(&id, false, None).await.unwrap();
        assert_eq!(updated.usage_count, 5);
        assert_eq!(updated.success_count, 4);
        assert!((updated.success_rate() - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn invalid_grades_are_rejected_not_clamped() {
        let (store, tracker) = tracker();
        let article = Article::builder("q", "a").build();
        let id = article.id.clone();
        store.create_article(article).await.unwrap();

        let result = tracker
            .update_confidence(&id, true, Some(GradeSet::new(6.0, 4.0, 4.0)))
            .await;
        assert!(matches!(result, Err(KbError::Validation(_))));

        // nothing was persisted
        let stored = store.get_article(&id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 0);
    }

    #[tokio::test]
    async fn update_of_missing_article_is_not_found() {
        let (_, tracker) = tracker();
        let result = tracker.update_confidence("missing", true, None).await;
        assert!(matches!(result, Err(KbError::NotFound(_))));
    }

    #[tokio::test]
    async fn archive_sweep_boundaries() {
        let (store, tracker) = tracker();
        let now = Utc::now();
        let stale_weak = Article::builder("stale weak", "a")
            .confidence(0.45)
            .last_used_at(now - chrono::Duration::days(95))
            .build();
        let stale_strong = Article::builder("stale strong", "a")
            .confidence(0.60)
            .last_used_at(now - chrono::Duration::days(95))
            .build();
        let fresh_weak = Article::builder("fresh weak", "a")
            .confidence(0.45)
            .last_used_at(now - chrono::Duration::days(10))
            .build();
        let weak_id = stale_weak.id.clone();
        for article in [stale_weak, stale_strong, fresh_weak] {
            store.create_article(article).await.unwrap();
        }

        let archived = tracker.archive_stale().await.unwrap();
        assert_eq!(archived, vec![weak_id.clone()]);
        assert!(store
            .get_article(&weak_id)
            .await
            .unwrap()
            .unwrap()
            .is_archived());
    }

    #[tokio::test]
    async fn review_flags_fire_per_condition() {
        let (store, tracker) = tracker();
        let low_confidence = Article::builder("low conf", "a").confidence(0.3).build();
        let low_accuracy = Article::builder("low acc", "a")
            .confidence(0.7)
            .grades(GradeSet::new(4.0, 2.5, 4.0))
            .build();
        let failing = Article::builder("failing", "a")
            .confidence(0.7)
            .usage(10, 2)
            .build();
        let healthy = Article::builder("healthy", "a")
            .confidence(0.9)
            .usage(10, 9)
            .grades(GradeSet::new(4.5, 4.5, 4.5))
            .build();
        for article in [low_confidence, low_accuracy, failing, healthy] {
            store.create_article(article).await.unwrap();
        }

        let flags = tracker.flag_for_review().await.unwrap();
        assert_eq!(flags.len(), 3);
        let reasons: Vec<&str> = flags.iter().map(|f| f.reason.as_str()).collect();
        assert!(reasons.contains(&"Very low confidence score"));
        assert!(reasons.contains(&"Low accuracy grades"));
        assert!(reasons.contains(&"High edit ratio - frequently requires corrections"));
    }
}
