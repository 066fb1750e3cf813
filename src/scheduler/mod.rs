//! Auto-update scheduler: batch maintenance over articles and learnings.
//!
//! Externally triggered (cron or job runner); scheduling itself lives
//! outside this crate. Errors propagate to the caller since silent failure
//! on these batch paths would lose learning data.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::confidence::ConfidenceTracker;
use crate::config::SchedulerConfig;
use crate::models::{ArticleCategory, GradeSet};
use crate::storage::{ArticleFilter, ArticleStore, KbStore, LearningEditFilter, LearningStore};
use crate::Result;

/// One routed maintenance event
#[derive(Debug, Clone)]
pub enum UpdateTrigger {
    /// Grades >= 4 with a near-untouched draft
    HighQualityApproval {
        article_id: String,
        grades: GradeSet,
    },
    /// Grades >= 4 with a heavy rewrite; the improved answer replaces the
    /// article text
    SignificantEdit {
        article_id: String,
        improved_answer: String,
        grades: GradeSet,
    },
    /// Mean grade <= 2; counts as an unsuccessful use
    LowGrade {
        article_id: String,
        grades: GradeSet,
    },
    /// A recurring issue that may need a new article
    RecurringPattern {
        pattern: String,
        category: ArticleCategory,
        tags: Vec<String>,
        occurrence_count: u32,
    },
}

/// Counts from one learning replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Articles that received a confidence or text update
    pub updated: usize,
    /// Edits that warrant a new article but have none linked yet
    pub created: usize,
    /// Articles flagged after a low-grade event
    pub flagged: usize,
}

/// Results of one full scheduled run
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledRunSummary {
    pub batch: BatchSummary,
    /// Ids of articles flagged as stale (unused 60 to 90 days)
    pub stale_flagged: Vec<String>,
    pub merged_duplicates: usize,
}

/// Batch maintenance over the knowledge base
#[derive(Clone)]
pub struct AutoUpdater {
    store: Arc<dyn KbStore>,
    tracker: ConfidenceTracker,
    config: SchedulerConfig,
}

impl AutoUpdater {
    pub fn new(
        store: Arc<dyn KbStore>,
        tracker: ConfidenceTracker,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            tracker,
            config,
        }
    }

    /// Apply one update trigger.
    pub async fn process_trigger(&self, trigger: UpdateTrigger) -> Result<()> {
        match trigger {
            UpdateTrigger::HighQualityApproval { article_id, grades } => {
                self.tracker
                    .update_confidence(&article_id, true, Some(grades))
                    .await?;
                debug!(%article_id, "high quality approval processed");
            }
            UpdateTrigger::SignificantEdit {
                article_id,
                improved_answer,
                grades,
            } => {
                let mut article = self
                    .store
                    .get_article(&article_id)
                    .await?
                    .ok_or_else(|| crate::KbError::NotFound(format!("article {}", article_id)))?;
                article.answer = improved_answer;
                // Text changed, so the stored embedding is stale; backfill
                // regenerates it.
                article.embedding = None;
                article.updated_at = Utc::now();
                self.store.update_article(article).await?;

                self.tracker
                    .update_confidence(&article_id, true, Some(grades))
                    .await?;
                info!(%article_id, "article updated with improved answer");
            }
            UpdateTrigger::LowGrade { article_id, grades } => {
                let updated = self
                    .tracker
                    .update_confidence(&article_id, false, Some(grades))
                    .await?;
                if updated.confidence_score < 0.40 {
                    warn!(
                        %article_id,
                        confidence = updated.confidence_score,
                        "article flagged for review after low grade"
                    );
                }
            }
            UpdateTrigger::RecurringPattern {
                pattern,
                category,
                tags,
                occurrence_count,
            } => {
                let peers = self
                    .store
                    .list_articles(ArticleFilter::active().with_category(category), None)
                    .await?;
                let covered = peers
                    .iter()
                    .any(|a| tags.iter().all(|t| a.tags.contains(t)));
                if covered {
                    debug!(%pattern, "recurring pattern matches existing article");
                } else {
                    // Advisory only; article creation stays a human decision
                    warn!(%pattern, occurrence_count, "recurring pattern needs an article");
                }
            }
        }
        Ok(())
    }

    /// Replay learning edits from the lookback window, routing each to the
    /// matching handler.
    pub async fn batch_update_from_learnings(&self) -> Result<BatchSummary> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.lookback)
                .unwrap_or_else(|_| chrono::Duration::hours(24));
        let learnings = self
            .store
            .list_edits(LearningEditFilter::since(cutoff), None)
            .await?;
        if learnings.is_empty() {
            return Ok(BatchSummary::default());
        }

        let mut summary = BatchSummary::default();
        for learning in learnings {
            let avg_grade = learning.grades.mean();

            if learning.edit_ratio < 0.1 && avg_grade >= 4.0 {
                if let Some(article_id) = &learning.article_id {
                    self.process_trigger(UpdateTrigger::HighQualityApproval {
                        article_id: article_id.clone(),
                        grades: learning.grades,
                    })
                    .await?;
                    summary.updated += 1;
                }
            } else if learning.edit_ratio >= 0.3 && avg_grade >= 4.0 {
                if let Some(article_id) = &learning.article_id {
                    self.process_trigger(UpdateTrigger::SignificantEdit {
                        article_id: article_id.clone(),
                        improved_answer: learning.human_final.clone(),
                        grades: learning.grades,
                    })
                    .await?;
                    summary.updated += 1;
                } else {
                    // No linked article yet; the learning pipeline owns
                    // creation, this pass only counts the demand.
                    summary.created += 1;
                }
            } else if avg_grade <= 2.0 {
                if let Some(article_id) = &learning.article_id {
                    self.process_trigger(UpdateTrigger::LowGrade {
                        article_id: article_id.clone(),
                        grades: learning.grades,
                    })
                    .await?;
                    summary.flagged += 1;
                }
            }
        }

        info!(
            updated = summary.updated,
            created = summary.created,
            flagged = summary.flagged,
            "batch update completed"
        );
        Ok(summary)
    }

    /// Flag (never archive) articles unused for 60 to 90 days.
    ///
    /// Anything past 90 days belongs to the archive sweep instead.
    pub async fn sweep_stale(&self) -> Result<Vec<String>> {
        let now = Utc::now();
        let articles = self.store.list_articles(ArticleFilter::active(), None).await?;

        let mut flagged = Vec::new();
        for article in &articles {
            let days = article.days_since_last_use(now);
            if days > 60 && days < 90 {
                debug!(article_id = %article.id, days, "stale article detected");
                flagged.push(article.id.clone());
            }
        }
        Ok(flagged)
    }

    /// Merge duplicate articles within a category.
    ///
    /// Pairwise token-set Jaccard over active questions; O(n^2) over the
    /// active corpus, an accepted cost at the expected size (low
    /// thousands). The lower-confidence article's counts fold into the
    /// higher-confidence one, then the loser is archived.
    pub async fn merge_duplicates(&self) -> Result<usize> {
        let mut articles = self.store.list_articles(ArticleFilter::active(), None).await?;
        if articles.len() < 2 {
            return Ok(0);
        }
        articles.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut merged = 0;
        let mut archived: HashSet<String> = HashSet::new();

        for i in 0..articles.len() {
            if archived.contains(&articles[i].id) {
                continue;
            }
            for j in (i + 1)..articles.len() {
                if archived.contains(&articles[j].id) {
                    continue;
                }
                if articles[i].category != articles[j].category {
                    continue;
                }
                let similarity =
                    question_similarity(&articles[i].question, &articles[j].question);
                if similarity <= self.config.duplicate_similarity_threshold {
                    continue;
                }

                // Sorted by confidence, so i is the keeper
                let mut keeper = articles[i].clone();
                let loser = articles[j].clone();

                keeper.usage_count += loser.usage_count;
                keeper.success_count += loser.success_count;
                keeper.updated_at = Utc::now();
                self.store.update_article(keeper.clone()).await?;
                articles[i] = keeper;

                let mut loser = loser;
                loser.archived_at = Some(Utc::now());
                loser.updated_at = Utc::now();
                let loser_id = loser.id.clone();
                self.store.update_article(loser).await?;
                archived.insert(loser_id.clone());

                info!(kept = %articles[i].id, archived = %loser_id, "merged duplicate articles");
                merged += 1;
            }
        }
        Ok(merged)
    }

    /// One full scheduled pass: learning replay, stale sweep, duplicate
    /// merge.
    pub async fn run_scheduled_updates(&self) -> Result<ScheduledRunSummary> {
        info!("running scheduled knowledge base updates");

        let batch = self.batch_update_from_learnings().await?;
        let stale_flagged = self.sweep_stale().await?;
        let merged_duplicates = self.merge_duplicates().await?;

        info!(
            updated = batch.updated,
            stale = stale_flagged.len(),
            merged = merged_duplicates,
            "scheduled updates completed"
        );
        Ok(ScheduledRunSummary {
            batch,
            stale_flagged,
            merged_duplicates,
        })
    }
}

/// Token-set Jaccard similarity between two questions
fn question_similarity(q1: &str, q2: &str) -> f32 {
    let lower1 = q1.to_lowercase();
    let lower2 = q2.to_lowercase();
    let words1: HashSet<&str> = lower1.split_whitespace().collect();
    let words2: HashSet<&str> = lower2.split_whitespace().collect();

    let intersection = words1.intersection(&words2).count();
    let union = words1.union(&words2).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f32 / union as f32
}
