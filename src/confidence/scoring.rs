//! Pure scoring functions for the confidence model.
//!
//! Everything in this module is side-effect free; the surrounding
//! [`ConfidenceTracker`](super::ConfidenceTracker) owns persistence.

use serde::{Deserialize, Serialize};

use crate::models::{Article, GradeSet};

/// Grade scale midpoint, used when an article has no grades yet
pub const GRADE_MIDPOINT: f32 = 2.5;
/// Top of the grade scale
pub const GRADE_MAX: f32 = 5.0;

/// Weights applied to the four confidence components.
///
/// Must sum to 1.0; validated at startup rather than assumed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceWeights {
    pub success_rate: f32,
    pub accuracy: f32,
    pub tone: f32,
    pub policy: f32,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            success_rate: 0.4,
            accuracy: 0.3,
            tone: 0.2,
            policy: 0.1,
        }
    }
}

impl ConfidenceWeights {
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("success_rate", self.success_rate),
            ("accuracy", self.accuracy),
            ("tone", self.tone),
            ("policy", self.policy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!(
                    "confidence weight {} must be in [0, 1], got {}",
                    name, value
                ));
            }
        }
        let sum = self.success_rate + self.accuracy + self.tone + self.policy;
        if (sum - 1.0).abs() > 1e-4 {
            return Err(format!("confidence weights must sum to 1.0, got {}", sum));
        }
        Ok(())
    }
}

/// Quality tier assigned to an article from its metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityTier {
    /// Ordering rank, higher is better
    pub fn rank(&self) -> u8 {
        match self {
            Self::Excellent => 3,
            Self::Good => 2,
            Self::Fair => 1,
            Self::Poor => 0,
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Fair => write!(f, "fair"),
            Self::Poor => write!(f, "poor"),
        }
    }
}

/// Minimum metrics an article must meet to earn a tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierBar {
    pub confidence: f32,
    pub success_rate: f32,
    pub avg_grade: f32,
}

impl TierBar {
    fn met(&self, confidence: f32, success_rate: f32, avg_grade: f32) -> bool {
        confidence >= self.confidence
            && success_rate >= self.success_rate
            && avg_grade >= self.avg_grade
    }

    fn strictly_above(&self, other: &TierBar) -> bool {
        self.confidence > other.confidence
            && self.success_rate > other.success_rate
            && self.avg_grade > other.avg_grade
    }
}

/// Tier thresholds, evaluated best-first; the first satisfied bar wins
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    pub excellent: TierBar,
    pub good: TierBar,
    pub fair: TierBar,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: TierBar {
                confidence: 0.80,
                success_rate: 0.80,
                avg_grade: 4.5,
            },
            good: TierBar {
                confidence: 0.70,
                success_rate: 0.70,
                avg_grade: 4.0,
            },
            fair: TierBar {
                confidence: 0.60,
                success_rate: 0.60,
                avg_grade: 3.5,
            },
        }
    }
}

impl TierThresholds {
    /// Bars must be strictly descending or tier assignment loses monotonicity.
    pub fn validate(&self) -> Result<(), String> {
        if !self.excellent.strictly_above(&self.good) {
            return Err("excellent tier bar must be strictly above good".to_string());
        }
        if !self.good.strictly_above(&self.fair) {
            return Err("good tier bar must be strictly above fair".to_string());
        }
        Ok(())
    }
}

/// A human-readable quality flag for one article
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewFlag {
    pub article_id: String,
    pub reason: String,
}

/// Per-article quality metrics snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QualityMetrics {
    pub confidence_score: f32,
    /// Usage relative to the category average
    pub usage_rate: f32,
    pub success_rate: f32,
    /// Rolling averages with missing grades reported as 0.0
    pub avg_grades: GradeSet,
    pub quality_tier: QualityTier,
    pub recommendations: Vec<String>,
}

/// System-wide quality summary across active articles
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QualityOverview {
    pub total_articles: usize,
    /// Fraction of active articles with at least one use
    pub coverage: f32,
    pub avg_confidence: f32,
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
    /// Mean grades over articles that have all three averages
    pub avg_grades: GradeSet,
}

/// Pure confidence and tier computations, parameterized by weights and
/// thresholds
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceModel {
    weights: ConfidenceWeights,
    tiers: TierThresholds,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self {
            weights: ConfidenceWeights::default(),
            tiers: TierThresholds::default(),
        }
    }
}

impl ConfidenceModel {
    pub fn new(weights: ConfidenceWeights, tiers: TierThresholds) -> Result<Self, String> {
        weights.validate()?;
        tiers.validate()?;
        Ok(Self { weights, tiers })
    }

    /// Weighted confidence score in [0, 1].
    ///
    /// Missing grade averages default to the scale midpoint before
    /// normalization.
    pub fn score(
        &self,
        success_rate: f32,
        avg_tone: Option<f32>,
        avg_accuracy: Option<f32>,
        avg_policy: Option<f32>,
    ) -> f32 {
        let tone = avg_tone.unwrap_or(GRADE_MIDPOINT) / GRADE_MAX;
        let accuracy = avg_accuracy.unwrap_or(GRADE_MIDPOINT) / GRADE_MAX;
        let policy = avg_policy.unwrap_or(GRADE_MIDPOINT) / GRADE_MAX;

        let score = success_rate * self.weights.success_rate
            + accuracy * self.weights.accuracy
            + tone * self.weights.tone
            + policy * self.weights.policy;
        score.clamp(0.0, 1.0)
    }

    pub fn score_article(&self, article: &Article) -> f32 {
        self.score(
            article.success_rate(),
            article.avg_tone_grade,
            article.avg_accuracy_grade,
            article.avg_policy_grade,
        )
    }

    /// Assign a tier from confidence, success rate, and mean grade.
    ///
    /// Bars are evaluated best-first, so for fixed success rate and grades
    /// a higher confidence can never produce a lower tier.
    pub fn tier(&self, confidence: f32, success_rate: f32, avg_grade: f32) -> QualityTier {
        if self.tiers.excellent.met(confidence, success_rate, avg_grade) {
            QualityTier::Excellent
        } else if self.tiers.good.met(confidence, success_rate, avg_grade) {
            QualityTier::Good
        } else if self.tiers.fair.met(confidence, success_rate, avg_grade) {
            QualityTier::Fair
        } else {
            QualityTier::Poor
        }
    }

    /// Tier for an article; missing grade averages count as zero here, so
    /// ungraded articles stay poor rather than coasting on the midpoint.
    pub fn tier_for_article(&self, article: &Article) -> QualityTier {
        let avg_grade = (article.avg_tone_grade.unwrap_or(0.0)
            + article.avg_accuracy_grade.unwrap_or(0.0)
            + article.avg_policy_grade.unwrap_or(0.0))
            / 3.0;
        self.tier(article.confidence_score, article.success_rate(), avg_grade)
    }

    /// Deterministic list of quality flags for one article.
    ///
    /// `usage_rate` is the article's usage relative to its category average.
    /// Order is fixed; multiple flags may fire at once.
    pub fn recommendations(
        &self,
        article: &Article,
        usage_rate: f32,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();
        let success_rate = article.success_rate();
        let tone = article.avg_tone_grade.unwrap_or(0.0);
        let accuracy = article.avg_accuracy_grade.unwrap_or(0.0);
        let policy = article.avg_policy_grade.unwrap_or(0.0);

        if article.confidence_score < 0.60 {
            recommendations
                .push("Low confidence score - consider reviewing and updating content".to_string());
        }
        if success_rate < 0.60 && article.usage_count >= 5 {
            recommendations.push(
                "Low success rate - article frequently requires edits, review for accuracy"
                    .to_string(),
            );
        }
        if tone > 0.0 && tone < 4.0 {
            recommendations
                .push("Tone could be improved - add more empathy and professionalism".to_string());
        }
        if accuracy > 0.0 && accuracy < 4.5 {
            recommendations
                .push("Accuracy issues detected - verify facts and update information".to_string());
        }
        if policy > 0.0 && policy < 4.5 {
            recommendations.push(
                "Policy compliance issues - ensure answer aligns with current policies".to_string(),
            );
        }
        if usage_rate < 0.5 && article.usage_count < 3 {
            recommendations.push(
                "Low usage - consider improving question phrasing or tags for better discoverability"
                    .to_string(),
            );
        }
        if article.days_since_last_use(now) > 60 {
            recommendations
                .push("Article not used recently - verify information is still current".to_string());
        }
        if article.usage_count == 0 {
            recommendations
                .push("No usage data yet - monitor performance after first uses".to_string());
        }

        recommendations
    }

    /// Summarize quality across a set of active articles.
    pub fn overview(&self, articles: &[Article]) -> QualityOverview {
        if articles.is_empty() {
            return QualityOverview {
                total_articles: 0,
                coverage: 0.0,
                avg_confidence: 0.0,
                excellent: 0,
                good: 0,
                fair: 0,
                poor: 0,
                avg_grades: GradeSet::new(0.0, 0.0, 0.0),
            };
        }

        let total = articles.len();
        let avg_confidence =
            articles.iter().map(|a| a.confidence_score).sum::<f32>() / total as f32;

        let (mut excellent, mut good, mut fair, mut poor) = (0, 0, 0, 0);
        for article in articles {
            match self.tier_for_article(article) {
                QualityTier::Excellent => excellent += 1,
                QualityTier::Good => good += 1,
                QualityTier::Fair => fair += 1,
                QualityTier::Poor => poor += 1,
            }
        }

        let graded: Vec<&Article> = articles
            .iter()
            .filter(|a| {
                a.avg_tone_grade.is_some()
                    && a.avg_accuracy_grade.is_some()
                    && a.avg_policy_grade.is_some()
            })
            .collect();
        let avg_grades = if graded.is_empty() {
            GradeSet::new(0.0, 0.0, 0.0)
        } else {
            let n = graded.len() as f32;
            GradeSet::new(
                graded.iter().filter_map(|a| a.avg_tone_grade).sum::<f32>() / n,
                graded
                    .iter()
                    .filter_map(|a| a.avg_accuracy_grade)
                    .sum::<f32>()
                    / n,
                graded.iter().filter_map(|a| a.avg_policy_grade).sum::<f32>() / n,
            )
        };

        let used = articles.iter().filter(|a| a.usage_count > 0).count();

        QualityOverview {
            total_articles: total,
            coverage: used as f32 / total as f32,
            avg_confidence,
            excellent,
            good,
            fair,
            poor,
            avg_grades,
        }
    }
}
