//! Learning pipeline: turns human edits of AI drafts into knowledge.
//!
//! Every reviewed draft/final pair is recorded as a [`LearningEdit`];
//! depending on the analysis the pipeline also creates a new article or
//! nudges the grades of an existing one. All free text passes through the
//! privacy scrubber before it is persisted.

pub mod analysis;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use analysis::{
    analyze, classify, edit_ratio, levenshtein, should_create_article, word_changes, EditAnalysis,
};

use crate::confidence::ConfidenceModel;
use crate::config::LearningConfig;
use crate::models::{
    Article, ArticleCategory, ArticleSource, GradeSet, LearningEdit, LearningType, RecurringIssue,
};
use crate::privacy::Scrubber;
use crate::storage::{ArticleFilter, ArticleStore, IssueFilter, KbStore, LearningStore};
use crate::{KbError, Result};

/// One human-reviewed draft/final pair entering the pipeline
#[derive(Debug, Clone)]
pub struct LearningInput {
    pub approval_id: String,
    pub conversation_id: String,
    pub ai_draft: String,
    pub human_final: String,
    pub customer_question: String,
    pub grades: GradeSet,
    pub reviewer: String,
    /// Explicit category; inferred from the question when absent
    pub category: Option<ArticleCategory>,
    /// Explicit tags; extracted from question and answer when absent
    pub tags: Option<Vec<String>>,
}

/// What one extraction produced
#[derive(Debug, Clone)]
pub struct LearningOutcome {
    pub edit: LearningEdit,
    /// New article, when the analysis warranted one
    pub created_article: Option<Article>,
    /// Article whose grades were nudged by a template refinement
    pub refined_article_id: Option<String>,
}

/// Learning extraction pipeline
#[derive(Clone)]
pub struct LearningPipeline {
    store: Arc<dyn KbStore>,
    scrubber: Scrubber,
    model: ConfidenceModel,
    config: LearningConfig,
}

impl LearningPipeline {
    pub fn new(
        store: Arc<dyn KbStore>,
        scrubber: Scrubber,
        model: ConfidenceModel,
        config: LearningConfig,
    ) -> Self {
        Self {
            store,
            scrubber,
            model,
            config,
        }
    }

    /// Ingest one reviewed pair: always records the edit, conditionally
    /// creates or refines an article.
    pub async fn extract_learning(&self, input: LearningInput) -> Result<LearningOutcome> {
        input.grades.validate().map_err(KbError::Validation)?;

        let analysis = analyze(&input.ai_draft, &input.human_final, &input.grades);

        let mut edit = LearningEdit {
            id: Uuid::new_v4().to_string(),
            approval_id: input.approval_id.clone(),
            conversation_id: input.conversation_id.clone(),
            ai_draft: input.ai_draft.clone(),
            human_final: input.human_final.clone(),
            edit_distance: analysis.edit_distance,
            edit_ratio: analysis.edit_ratio,
            grades: input.grades,
            customer_question: input.customer_question.clone(),
            category: input
                .category
                .unwrap_or_else(|| infer_category(&input.customer_question)),
            tags: input.tags.clone().unwrap_or_default(),
            learning_type: analysis.learning_type,
            magnitude: analysis.magnitude,
            changes: analysis.changes.clone(),
            reviewer: input.reviewer.clone(),
            article_id: None,
            created_at: Utc::now(),
        };

        // Hard privacy gate before anything touches storage
        let pii = self.scrubber.scrub_learning_edit(&mut edit);
        if !pii.is_empty() {
            debug!(edit_id = %edit.id, kinds = ?pii, "scrubbed PII from learning edit");
        }

        let edit = self.store.record_edit(edit).await?;

        let mut outcome = LearningOutcome {
            edit,
            created_article: None,
            refined_article_id: None,
        };

        if analysis.should_create_article {
            let article = self.create_article_from_edit(&outcome.edit, &input).await?;
            outcome.created_article = Some(article);
        } else if analysis.learning_type == LearningType::TemplateRefinement {
            outcome.refined_article_id = self.refine_similar_article(&outcome.edit).await?;
        }

        info!(
            edit_id = %outcome.edit.id,
            learning_type = %outcome.edit.learning_type,
            edit_ratio = outcome.edit.edit_ratio,
            article_created = outcome.created_article.is_some(),
            "learning extraction completed"
        );
        Ok(outcome)
    }

    /// Create a new article from an edit, seed its statistics, and link the
    /// edit back to it.
    async fn create_article_from_edit(
        &self,
        edit: &LearningEdit,
        input: &LearningInput,
    ) -> Result<Article> {
        // Scrubbed text from the stored edit, never the raw input
        let question = edit.customer_question.clone();
        let answer = edit.human_final.clone();
        let tags = input
            .tags
            .clone()
            .unwrap_or_else(|| extract_tags(&question, &answer));

        let mut article = Article::builder(question, answer)
            .category(edit.category)
            .tags(tags)
            .grades(edit.grades)
            .usage(1, 1)
            .source(ArticleSource::Extracted)
            .created_by("learning_pipeline")
            .build();
        article.confidence_score = self.model.score_article(&article);

        self.scrubber.scrub_article(&mut article);
        self.scrubber
            .validate_article_privacy(&article)
            .map_err(KbError::Privacy)?;

        let article = self.store.create_article(article).await?;
        self.store
            .link_edit_to_article(&edit.id, &article.id)
            .await?;

        info!(
            article_id = %article.id,
            category = %article.category,
            confidence = article.confidence_score,
            "created article from learning"
        );
        Ok(article)
    }

    /// Nudge the grade averages of the most similar existing article.
    ///
    /// Similarity is a containment match on the leading characters of the
    /// question; a lighter-weight update than the full incremental mean.
    async fn refine_similar_article(&self, edit: &LearningEdit) -> Result<Option<String>> {
        let prefix: String = edit
            .customer_question
            .chars()
            .take(self.config.refinement_prefix_len)
            .collect::<String>()
            .to_lowercase();
        if prefix.trim().is_empty() {
            return Ok(None);
        }

        let articles = self.store.list_articles(ArticleFilter::active(), None).await?;
        let Some(mut target) = articles
            .into_iter()
            .find(|a| a.question.to_lowercase().contains(&prefix))
        else {
            return Ok(None);
        };

        // Two-point mean toward the new grades
        target.avg_tone_grade =
            Some((target.avg_tone_grade.unwrap_or(0.0) + edit.grades.tone) / 2.0);
        target.avg_accuracy_grade =
            Some((target.avg_accuracy_grade.unwrap_or(0.0) + edit.grades.accuracy) / 2.0);
        target.avg_policy_grade =
            Some((target.avg_policy_grade.unwrap_or(0.0) + edit.grades.policy) / 2.0);
        target.updated_at = Utc::now();

        let target = self.store.update_article(target).await?;
        debug!(article_id = %target.id, "refined related article grades");
        Ok(Some(target.id))
    }

    /// Track one occurrence of a recurring issue pattern.
    ///
    /// Returns the issue and whether it crossed the advisory threshold on
    /// this call. The advisory is a flag for downstream curation, never an
    /// automatic article creation.
    pub async fn track_recurring_issue(
        &self,
        pattern: &str,
        category: ArticleCategory,
        tags: Vec<String>,
    ) -> Result<(RecurringIssue, bool)> {
        let normalized = normalize_pattern(pattern);
        if normalized.is_empty() {
            return Err(KbError::Validation(
                "issue pattern must not be empty".to_string(),
            ));
        }

        if let Some(mut issue) = self.store.find_issue_by_pattern(&normalized).await? {
            issue.occurrence_count += 1;
            issue.last_seen_at = Utc::now();
            let issue = self.store.update_issue(issue).await?;

            let advisory = issue.occurrence_count >= self.config.recurring_threshold
                && issue.resolution_status == crate::models::ResolutionStatus::Unresolved;
            if advisory {
                warn!(
                    pattern = %issue.pattern,
                    occurrences = issue.occurrence_count,
                    "recurring issue crossed threshold, flagging for article creation"
                );
            }
            Ok((issue, advisory))
        } else {
            let issue = self
                .store
                .create_issue(RecurringIssue::new(normalized, category, tags))
                .await?;
            Ok((issue, false))
        }
    }

    /// Issues still awaiting an article or a resolution decision.
    pub async fn open_issues(&self) -> Result<Vec<RecurringIssue>> {
        Ok(self.store.list_issues(IssueFilter::unresolved()).await?)
    }
}

/// Lower-case and collapse internal whitespace for exact-match lookup
fn normalize_pattern(pattern: &str) -> String {
    pattern
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered keyword lookup; first match wins, default products
pub fn infer_category(question: &str) -> ArticleCategory {
    let q = question.to_lowercase();

    const TABLE: &[(&[&str], ArticleCategory)] = &[
        (&["order", "purchase"], ArticleCategory::Orders),
        (&["ship", "deliver", "track"], ArticleCategory::Shipping),
        (&["return", "refund", "exchange"], ArticleCategory::Returns),
        (&["product", "item", "stock"], ArticleCategory::Products),
        (
            &["login", "account", "password", "error"],
            ArticleCategory::Technical,
        ),
        (
            &["policy", "warranty", "terms"],
            ArticleCategory::Policies,
        ),
    ];

    for (keywords, category) in TABLE {
        if keywords.iter().any(|k| q.contains(k)) {
            return *category;
        }
    }
    ArticleCategory::Products
}

/// Keyword-to-tag lookup over question and answer; default "general"
pub fn extract_tags(question: &str, answer: &str) -> Vec<String> {
    let combined = format!("{} {}", question, answer).to_lowercase();
    let mut tags = Vec::new();

    let mut tag_if = |keywords: &[&str], tag: &str| {
        if keywords.iter().any(|k| combined.contains(k)) {
            tags.push(tag.to_string());
        }
    };

    tag_if(&["track"], "order_tracking");
    tag_if(&["cancel"], "order_cancellation");
    tag_if(&["modify", "change"], "order_modification");

    tag_if(&["eta", "when"], "shipping_eta");
    tag_if(&["international"], "shipping_international");
    tag_if(&["delay"], "shipping_delay");
    tag_if(&["cost", "price"], "shipping_cost");

    tag_if(&["return policy"], "return_policy");
    tag_if(&["return process"], "return_process");
    tag_if(&["refund"], "refund_timeline");

    tag_if(&["stock", "available"], "product_availability");
    tag_if(&["spec", "dimension"], "product_specs");

    tag_if(&["login", "password"], "account_login");
    tag_if(&["payment", "checkout"], "payment_issue");

    tag_if(&["privacy"], "privacy_policy");
    tag_if(&["warranty"], "warranty_info");

    if tags.is_empty() {
        tags.push("general".to_string());
    }
    tags
}
