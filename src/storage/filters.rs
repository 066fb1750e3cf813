//! Filter types for storage queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ArticleCategory, LearningType, ResolutionStatus};

/// Filter for article queries.
///
/// Stores that cannot evaluate these conditions server-side must apply them
/// client-side; the two must produce identical result sets.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArticleFilter {
    /// Filter by category
    pub category: Option<ArticleCategory>,

    /// Confidence floor (inclusive)
    pub min_confidence: Option<f32>,

    /// Include soft-deleted articles; archived articles are excluded by default
    pub include_archived: bool,

    /// Only articles without a stored embedding
    pub missing_embedding: bool,
}

impl ArticleFilter {
    /// Filter matching every active article
    pub fn active() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: ArticleCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn with_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Client-side filter predicate; the normative semantics every
    /// [`ArticleStore`](super::traits::ArticleStore) implementation must match.
    pub fn matches(&self, article: &crate::models::Article) -> bool {
        if !self.include_archived && article.is_archived() {
            return false;
        }
        if let Some(category) = self.category {
            if article.category != category {
                return false;
            }
        }
        if let Some(floor) = self.min_confidence {
            if article.confidence_score < floor {
                return false;
            }
        }
        if self.missing_embedding && article.embedding.is_some() {
            return false;
        }
        true
    }
}

/// Filter for learning edit queries
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LearningEditFilter {
    /// Only edits created at or after this instant
    pub since: Option<DateTime<Utc>>,

    /// Filter by learning type
    pub learning_type: Option<LearningType>,

    /// Filter by approval identifier
    pub approval_id: Option<String>,
}

impl LearningEditFilter {
    pub fn since(ts: DateTime<Utc>) -> Self {
        Self {
            since: Some(ts),
            ..Default::default()
        }
    }

    /// Client-side filter predicate
    pub fn matches(&self, edit: &crate::models::LearningEdit) -> bool {
        if let Some(since) = self.since {
            if edit.created_at < since {
                return false;
            }
        }
        if let Some(learning_type) = self.learning_type {
            if edit.learning_type != learning_type {
                return false;
            }
        }
        if let Some(approval_id) = &self.approval_id {
            if &edit.approval_id != approval_id {
                return false;
            }
        }
        true
    }
}

/// Filter for recurring issue queries
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IssueFilter {
    /// Filter by resolution status
    pub resolution_status: Option<ResolutionStatus>,
}

impl IssueFilter {
    /// Filter matching only issues that still need attention
    pub fn unresolved() -> Self {
        Self {
            resolution_status: Some(ResolutionStatus::Unresolved),
        }
    }

    /// Client-side filter predicate
    pub fn matches(&self, issue: &crate::models::RecurringIssue) -> bool {
        if let Some(status) = self.resolution_status {
            if issue.resolution_status != status {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use chrono::Utc;

    #[test]
    fn article_filter_excludes_archived_by_default() {
        let mut article = Article::builder("q", "a").confidence(0.9).build();
        let filter = ArticleFilter::active();
        assert!(filter.matches(&article));

        article.archived_at = Some(Utc::now());
        assert!(!filter.matches(&article));
        assert!(filter.clone().with_archived().matches(&article));
    }

    #[test]
    fn article_filter_confidence_floor_is_inclusive() {
        let article = Article::builder("q", "a").confidence(0.6).build();
        assert!(ArticleFilter::active().with_min_confidence(0.6).matches(&article));
        assert!(!ArticleFilter::active().with_min_confidence(0.61).matches(&article));
    }

    #[test]
    fn article_filter_missing_embedding() {
        let with = Article::builder("q", "a").embedding(vec![0.1]).build();
        let without = Article::builder("q", "a").build();
        let filter = ArticleFilter {
            missing_embedding: true,
            ..Default::default()
        };
        assert!(!filter.matches(&with));
        assert!(filter.matches(&without));
    }
}
