//! Learning records: human edit captures, recurring issues, usage logs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ArticleCategory, GradeSet};

/// Why a human changed an AI draft
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LearningType {
    /// Wording softened or warmed up; facts and policy were fine
    ToneImprovement,
    /// The draft got something wrong
    FactualCorrection,
    /// The draft contradicted or omitted policy
    PolicyClarification,
    /// Small polish on an already-good answer
    TemplateRefinement,
    /// A substantially new answer the knowledge base did not cover
    NewPattern,
}

impl std::fmt::Display for LearningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToneImprovement => write!(f, "tone_improvement"),
            Self::FactualCorrection => write!(f, "factual_correction"),
            Self::PolicyClarification => write!(f, "policy_clarification"),
            Self::TemplateRefinement => write!(f, "template_refinement"),
            Self::NewPattern => write!(f, "new_pattern"),
        }
    }
}

/// Coarse bucket for how much of the draft was rewritten
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditMagnitude {
    /// Edit ratio < 0.1
    Minor,
    /// Edit ratio < 0.3
    Moderate,
    /// Edit ratio < 0.6
    Major,
    /// Edit ratio >= 0.6
    CompleteRewrite,
}

impl EditMagnitude {
    pub fn from_ratio(ratio: f32) -> Self {
        if ratio < 0.1 {
            Self::Minor
        } else if ratio < 0.3 {
            Self::Moderate
        } else if ratio < 0.6 {
            Self::Major
        } else {
            Self::CompleteRewrite
        }
    }
}

/// Kind of a single word-level change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Addition,
    Deletion,
    Modification,
}

/// One word-level change between the AI draft and the human final text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordChange {
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised: Option<String>,
    pub position: usize,
}

/// A record of one human revision of an AI draft.
///
/// Immutable after creation except for `article_id`, which is set at most
/// once when an article is created or updated from this edit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearningEdit {
    pub id: String,
    pub approval_id: String,
    pub conversation_id: String,
    pub ai_draft: String,
    pub human_final: String,
    pub edit_distance: usize,
    pub edit_ratio: f32,
    pub grades: GradeSet,
    pub customer_question: String,
    pub category: ArticleCategory,
    pub tags: Vec<String>,
    pub learning_type: LearningType,
    pub magnitude: EditMagnitude,
    pub changes: Vec<WordChange>,
    pub reviewer: String,
    /// Back-reference to the article created or updated from this edit
    pub article_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Resolution state of a recurring issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Unresolved,
    InProgress,
    Resolved,
    Dismissed,
}

impl Default for ResolutionStatus {
    fn default() -> Self {
        Self::Unresolved
    }
}

/// An unresolved pattern observed across multiple conversations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringIssue {
    pub id: String,
    /// Normalized pattern text used for exact-match lookup
    pub pattern: String,
    pub category: ArticleCategory,
    pub tags: Vec<String>,
    pub occurrence_count: u32,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub resolution_status: ResolutionStatus,
}

impl RecurringIssue {
    pub fn new(pattern: impl Into<String>, category: ArticleCategory, tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            pattern: pattern.into(),
            category,
            tags,
            occurrence_count: 1,
            first_seen_at: now,
            last_seen_at: now,
            resolution_status: ResolutionStatus::Unresolved,
        }
    }
}

/// Append-only record linking an article to a usage event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageLog {
    pub id: String,
    pub article_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_helpful: Option<bool>,
    pub used_at: DateTime<Utc>,
}

impl UsageLog {
    pub fn new(
        article_id: impl Into<String>,
        approval_id: Option<String>,
        was_helpful: Option<bool>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            article_id: article_id.into(),
            approval_id,
            was_helpful,
            used_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_buckets() {
        assert_eq!(EditMagnitude::from_ratio(0.05), EditMagnitude::Minor);
        assert_eq!(EditMagnitude::from_ratio(0.1), EditMagnitude::Moderate);
        assert_eq!(EditMagnitude::from_ratio(0.29), EditMagnitude::Moderate);
        assert_eq!(EditMagnitude::from_ratio(0.45), EditMagnitude::Major);
        assert_eq!(EditMagnitude::from_ratio(0.6), EditMagnitude::CompleteRewrite);
        assert_eq!(EditMagnitude::from_ratio(2.5), EditMagnitude::CompleteRewrite);
    }

    #[test]
    fn recurring_issue_starts_unresolved() {
        let issue = RecurringIssue::new("where is my refund", ArticleCategory::Returns, vec![]);
        assert_eq!(issue.occurrence_count, 1);
        assert_eq!(issue.resolution_status, ResolutionStatus::Unresolved);
        assert_eq!(issue.first_seen_at, issue.last_seen_at);
    }

    #[test]
    fn learning_type_display() {
        assert_eq!(LearningType::NewPattern.to_string(), "new_pattern");
        assert_eq!(LearningType::ToneImprovement.to_string(), "tone_improvement");
    }
}
