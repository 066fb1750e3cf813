//! Integration tests for the learning pipeline
//!
//! These tests verify the complete learning workflow including:
//! - Edit analysis and article creation from heavily-revised drafts
//! - Template refinement nudges against existing articles
//! - Recurring issue tracking and the advisory threshold
//! - PII scrubbing on every persistence path

use std::sync::Arc;

use supportkb::config::LearningConfig;
use supportkb::confidence::ConfidenceModel;
use supportkb::learning::{LearningInput, LearningPipeline};
use supportkb::models::{Article, ArticleCategory, GradeSet, LearningType};
use supportkb::privacy::Scrubber;
use supportkb::storage::{ArticleStore, InMemoryKbStore, LearningEditFilter, LearningStore};

fn pipeline() -> (Arc<InMemoryKbStore>, LearningPipeline) {
    let store = Arc::new(InMemoryKbStore::new());
    let pipeline = LearningPipeline::new(
        store.clone(),
        Scrubber::new(),
        ConfidenceModel::default(),
        LearningConfig::default(),
    );
    (store, pipeline)
}

fn input(draft: &str, human_final: &str, grades: GradeSet) -> LearningInput {
    LearningInput {
        approval_id: "approval-1".to_string(),
        conversation_id: "conv-1".to_string(),
        ai_draft: draft.to_string(),
        human_final: human_final.to_string(),
        customer_question: "When will my order arrive?".to_string(),
        grades,
        reviewer: "agent-smith".to_string(),
        category: None,
        tags: None,
    }
}

#[tokio::test]
async fn heavy_rewrite_with_top_grades_creates_an_article() {
    let (store, pipeline) = pipeline();

    let draft = "Your order will arrive soon.";
    let human_final = "Your order shipped yesterday via standard delivery and should \
                       arrive within three to five business days. You can follow it \
                       live from the tracking page in your account.";

    let outcome = pipeline
        .extract_learning(input(draft, human_final, GradeSet::new(5.0, 5.0, 5.0)))
        .await
        .expect("Should extract learning");

    assert_eq!(outcome.edit.learning_type, LearningType::NewPattern);
    assert!(outcome.edit.edit_ratio >= 0.3);

    let article = outcome.created_article.expect("Should create an article");
    assert_eq!(article.usage_count, 1);
    assert_eq!(article.success_count, 1);
    assert!(article.confidence_score > 0.9);
    // inferred from the question keywords
    assert_eq!(article.category, ArticleCategory::Orders);

    // the stored edit is back-linked to the article
    let edits = store
        .list_edits(LearningEditFilter::default(), None)
        .await
        .expect("Should list edits");
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].article_id.as_deref(), Some(article.id.as_str()));
}

#[tokio::test]
async fn light_polish_records_the_edit_without_creating() {
    let (store, pipeline) = pipeline();

    let outcome = pipeline
        .extract_learning(input(
            "Your order is on the way.",
            "Your order is on its way.",
            GradeSet::new(4.5, 4.5, 4.5),
        ))
        .await
        .expect("Should extract learning");

    assert_eq!(outcome.edit.learning_type, LearningType::TemplateRefinement);
    assert!(outcome.created_article.is_none());

    let edits = store
        .list_edits(LearningEditFilter::default(), None)
        .await
        .expect("Should list edits");
    assert_eq!(edits.len(), 1);
}

#[tokio::test]
async fn template_refinement_nudges_an_existing_article() {
    let (store, pipeline) = pipeline();

    let existing = Article::builder(
        "When will my order arrive? I ordered last Tuesday.",
        "Orders arrive within five business days.",
    )
    .category(ArticleCategory::Orders)
    .grades(GradeSet::new(3.0, 3.0, 3.0))
    .confidence(0.7)
    .build();
    let existing = store
        .create_article(existing)
        .await
        .expect("Should create article");

    let outcome = pipeline
        .extract_learning(input(
            "Orders arrive within five business days.",
            "Orders arrive within five business days!",
            GradeSet::new(5.0, 5.0, 5.0),
        ))
        .await
        .expect("Should extract learning");

    assert_eq!(outcome.refined_article_id.as_deref(), Some(existing.id.as_str()));

    let refined = store
        .get_article(&existing.id)
        .await
        .expect("Should get article")
        .expect("Article should exist");
    // two-point mean of 3.0 and 5.0
    assert!((refined.avg_tone_grade.unwrap() - 4.0).abs() < 1e-6);
    assert!((refined.avg_accuracy_grade.unwrap() - 4.0).abs() < 1e-6);
}

#[tokio::test]
async fn pii_never_reaches_the_store() {
    let (store, pipeline) = pipeline();

    let human_final = "Your order shipped yesterday via standard delivery and should \
                       arrive within five business days. If anything looks wrong, \
                       reply here instead of emailing jane.doe@example.com or calling \
                       555-867-5309 so we keep the full history in one place.";

    let outcome = pipeline
        .extract_learning(input(
            "Your order will arrive soon.",
            human_final,
            GradeSet::new(5.0, 5.0, 5.0),
        ))
        .await
        .expect("Should extract learning");

    assert!(!outcome.edit.human_final.contains("jane.doe@example.com"));
    assert!(outcome.edit.human_final.contains("[email redacted]"));

    let article = outcome.created_article.expect("Should create an article");
    assert!(!article.answer.contains("jane.doe@example.com"));
    assert!(!article.answer.contains("555-867-5309"));

    let stored = store
        .get_article(&article.id)
        .await
        .expect("Should get article")
        .expect("Article should exist");
    assert!(Scrubber::new()
        .validate_article_privacy(&stored)
        .is_ok());
}

#[tokio::test]
async fn invalid_grades_are_rejected_up_front() {
    let (store, pipeline) = pipeline();

    let result = pipeline
        .extract_learning(input(
            "draft",
            "final",
            GradeSet::new(6.0, 4.0, 4.0),
        ))
        .await;
    assert!(result.is_err());

    let edits = store
        .list_edits(LearningEditFilter::default(), None)
        .await
        .expect("Should list edits");
    assert!(edits.is_empty());
}

#[tokio::test]
async fn recurring_issue_flags_on_the_third_occurrence() {
    let (_store, pipeline) = pipeline();
    let tags = vec!["sizing".to_string()];

    let (issue, advisory) = pipeline
        .track_recurring_issue("Sizing runs small", ArticleCategory::Products, tags.clone())
        .await
        .expect("Should track issue");
    assert_eq!(issue.occurrence_count, 1);
    assert!(!advisory);

    // normalization makes these the same pattern
    let (issue, advisory) = pipeline
        .track_recurring_issue("sizing  runs   SMALL", ArticleCategory::Products, tags.clone())
        .await
        .expect("Should track issue");
    assert_eq!(issue.occurrence_count, 2);
    assert!(!advisory);

    let (issue, advisory) = pipeline
        .track_recurring_issue("sizing runs small", ArticleCategory::Products, tags)
        .await
        .expect("Should track issue");
    assert_eq!(issue.occurrence_count, 3);
    assert!(advisory);
    assert_eq!(
        issue.resolution_status,
        supportkb::models::ResolutionStatus::Unresolved
    );

    let open = pipeline.open_issues().await.expect("Should list open issues");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, issue.id);
}
