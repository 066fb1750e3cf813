//! Article model representing a reusable question/answer pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed category set for knowledge base articles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ArticleCategory {
    /// Order status, cancellation, modification
    Orders,
    /// Shipping times, tracking, carriers
    Shipping,
    /// Returns, refunds, exchanges
    Returns,
    /// Product availability, specs, stock
    Products,
    /// Accounts, logins, payment issues
    Technical,
    /// Warranties, terms, store policies
    Policies,
}

impl Default for ArticleCategory {
    fn default() -> Self {
        Self::Products
    }
}

impl std::fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Orders => write!(f, "orders"),
            Self::Shipping => write!(f, "shipping"),
            Self::Returns => write!(f, "returns"),
            Self::Products => write!(f, "products"),
            Self::Technical => write!(f, "technical"),
            Self::Policies => write!(f, "policies"),
        }
    }
}

impl ArticleCategory {
    /// Convert a string to a category, falling back to the default
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "orders" => Self::Orders,
            "shipping" => Self::Shipping,
            "returns" => Self::Returns,
            "products" => Self::Products,
            "technical" => Self::Technical,
            "policies" => Self::Policies,
            _ => Self::Products,
        }
    }
}

/// How an article entered the knowledge base
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSource {
    /// Derived from a human edit of an AI draft
    HumanEdit,
    /// Seeded from a response template
    Template,
    /// Created by the learning pipeline
    Extracted,
    /// Curated by hand
    Manual,
}

impl std::fmt::Display for ArticleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HumanEdit => write!(f, "human_edit"),
            Self::Template => write!(f, "template"),
            Self::Extracted => write!(f, "extracted"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// One set of human review grades, each in [1, 5]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradeSet {
    pub tone: f32,
    pub accuracy: f32,
    pub policy: f32,
}

impl GradeSet {
    pub fn new(tone: f32, accuracy: f32, policy: f32) -> Self {
        Self {
            tone,
            accuracy,
            policy,
        }
    }

    /// Mean of the three grades
    pub fn mean(&self) -> f32 {
        (self.tone + self.accuracy + self.policy) / 3.0
    }

    /// Validate that every grade lies in [1, 5]
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("tone", self.tone),
            ("accuracy", self.accuracy),
            ("policy", self.policy),
        ] {
            if !(1.0..=5.0).contains(&value) {
                return Err(format!("{} grade must be in [1, 5], got {}", name, value));
            }
        }
        Ok(())
    }
}

/// A question/answer pair usable as agent context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique identifier
    pub id: String,

    /// Category this article answers questions in
    pub category: ArticleCategory,

    /// The customer-facing question
    pub question: String,

    /// The proven answer
    pub answer: String,

    /// Free-form tags for keyword matching and curation
    pub tags: Vec<String>,

    /// Reliability estimate in [0, 1]
    pub confidence_score: f32,

    /// How many times the article has been used in a draft
    pub usage_count: u32,

    /// How many of those uses were successful
    pub success_count: u32,

    /// Rolling average tone grade (None until first grade)
    pub avg_tone_grade: Option<f32>,

    /// Rolling average accuracy grade (None until first grade)
    pub avg_accuracy_grade: Option<f32>,

    /// Rolling average policy grade (None until first grade)
    pub avg_policy_grade: Option<f32>,

    /// Embedding vector, regenerated whenever question/answer text changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// How the article entered the knowledge base
    pub source: ArticleSource,

    /// Who created the article
    pub created_by: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// When the article was last used in a draft
    pub last_used_at: Option<DateTime<Utc>>,

    /// Soft-delete timestamp; None means active
    pub archived_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Create a builder for constructing an article
    pub fn builder(question: impl Into<String>, answer: impl Into<String>) -> ArticleBuilder {
        ArticleBuilder::new(question, answer)
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Successful uses over total uses; zero when never used
    pub fn success_rate(&self) -> f32 {
        if self.usage_count > 0 {
            self.success_count as f32 / self.usage_count as f32
        } else {
            0.0
        }
    }

    /// Mean of the three rolling grade averages, if all are present
    pub fn avg_grade_mean(&self) -> Option<f32> {
        match (
            self.avg_tone_grade,
            self.avg_accuracy_grade,
            self.avg_policy_grade,
        ) {
            (Some(t), Some(a), Some(p)) => Some((t + a + p) / 3.0),
            _ => None,
        }
    }

    /// Whole days since the article was last used.
    ///
    /// Articles never used report a sentinel large enough to trip every
    /// staleness threshold.
    pub fn days_since_last_use(&self, now: DateTime<Utc>) -> i64 {
        match self.last_used_at {
            Some(ts) => (now - ts).num_days(),
            None => 999,
        }
    }

    /// Lower-cased concatenation of question, answer, and tags for
    /// keyword matching
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.question, self.answer, self.tags.join(" ")).to_lowercase()
    }
}

/// Builder for [`Article`] instances
#[derive(Debug, Clone)]
pub struct ArticleBuilder {
    article: Article,
}

impl ArticleBuilder {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            article: Article {
                id: Uuid::new_v4().to_string(),
                category: ArticleCategory::default(),
                question: question.into(),
                answer: answer.into(),
                tags: Vec::new(),
                confidence_score: 0.0,
                usage_count: 0,
                success_count: 0,
                avg_tone_grade: None,
                avg_accuracy_grade: None,
                avg_policy_grade: None,
                embedding: None,
                source: ArticleSource::Manual,
                created_by: "unknown".to_string(),
                created_at: now,
                updated_at: now,
                last_used_at: None,
                archived_at: None,
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.article.id = id.into();
        self
    }

    pub fn category(mut self, category: ArticleCategory) -> Self {
        self.article.category = category;
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.article.tags = tags;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.article.tags.push(tag.into());
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.article.confidence_score = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn usage(mut self, usage_count: u32, success_count: u32) -> Self {
        self.article.usage_count = usage_count;
        self.article.success_count = success_count.min(usage_count);
        self
    }

    pub fn grades(mut self, grades: GradeSet) -> Self {
        self.article.avg_tone_grade = Some(grades.tone);
        self.article.avg_accuracy_grade = Some(grades.accuracy);
        self.article.avg_policy_grade = Some(grades.policy);
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.article.embedding = Some(embedding);
        self
    }

    pub fn source(mut self, source: ArticleSource) -> Self {
        self.article.source = source;
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.article.created_by = created_by.into();
        self
    }

    pub fn last_used_at(mut self, ts: DateTime<Utc>) -> Self {
        self.article.last_used_at = Some(ts);
        self
    }

    pub fn build(self) -> Article {
        self.article
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let article = Article::builder("How do I track my order?", "Use the tracking page.")
            .category(ArticleCategory::Orders)
            .tag("order_tracking")
            .build();

        assert_eq!(article.category, ArticleCategory::Orders);
        assert_eq!(article.usage_count, 0);
        assert!(!article.is_archived());
        assert_eq!(article.success_rate(), 0.0);
        assert!(article.avg_grade_mean().is_none());
    }

    #[test]
    fn success_rate_bounds() {
        let article = Article::builder("q", "a").usage(10, 7).build();
        assert!((article.success_rate() - 0.7).abs() < 1e-6);

        // success_count is capped at usage_count
        let article = Article::builder("q", "a").usage(3, 9).build();
        assert!(article.success_count <= article.usage_count);
    }

    #[test]
    fn never_used_counts_as_stale() {
        let article = Article::builder("q", "a").build();
        assert!(article.days_since_last_use(Utc::now()) > 90);
    }

    #[test]
    fn category_from_str_falls_back() {
        assert_eq!(ArticleCategory::from_str("returns"), ArticleCategory::Returns);
        assert_eq!(ArticleCategory::from_str("nonsense"), ArticleCategory::Products);
    }

    #[test]
    fn grade_set_validation() {
        assert!(GradeSet::new(5.0, 4.0, 3.0).validate().is_ok());
        assert!(GradeSet::new(0.5, 4.0, 3.0).validate().is_err());
        assert!(GradeSet::new(2.0, 6.0, 3.0).validate().is_err());
    }

    #[test]
    fn searchable_text_is_lowercased() {
        let article = Article::builder("Where IS my Order?", "Check Tracking.")
            .tag("Order_Tracking")
            .build();
        let text = article.searchable_text();
        assert!(text.contains("where is my order?"));
        assert!(text.contains("order_tracking"));
    }
}
