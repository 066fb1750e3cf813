//! Trait definitions for knowledge base storage backends

use std::fmt::Debug;

use async_trait::async_trait;

use crate::models::{Article, LearningEdit, RecurringIssue, UsageLog};
use crate::storage::errors::StorageResult;
use crate::storage::filters::{ArticleFilter, IssueFilter, LearningEditFilter};

/// Base trait for all storage implementations
#[async_trait]
pub trait BaseStore: Send + Sync + 'static + Debug {
    /// Check if the store is healthy and available
    async fn health_check(&self) -> StorageResult<bool>;

    /// Clear all data in the store
    async fn clear(&self) -> StorageResult<()>;
}

/// Trait for article operations.
///
/// Implementations may evaluate [`ArticleFilter`] server-side or fall back to
/// client-side filtering via [`ArticleFilter::matches`]; both must return
/// identical result sets.
#[async_trait]
pub trait ArticleStore: BaseStore {
    /// Create a new article
    async fn create_article(&self, article: Article) -> StorageResult<Article>;

    /// Get an article by its ID
    async fn get_article(&self, id: &str) -> StorageResult<Option<Article>>;

    /// Update an existing article by ID
    async fn update_article(&self, article: Article) -> StorageResult<Article>;

    /// List articles matching a filter, ordered by creation time
    async fn list_articles(
        &self,
        filter: ArticleFilter,
        limit: Option<usize>,
    ) -> StorageResult<Vec<Article>>;

    /// Count articles matching a filter
    async fn count_articles(&self, filter: ArticleFilter) -> StorageResult<usize>;
}

/// Trait for learning pipeline records: edits, recurring issues, usage logs
#[async_trait]
pub trait LearningStore: BaseStore {
    /// Record a learning edit
    async fn record_edit(&self, edit: LearningEdit) -> StorageResult<LearningEdit>;

    /// Get a learning edit by its ID
    async fn get_edit(&self, id: &str) -> StorageResult<Option<LearningEdit>>;

    /// Set the article back-reference on an edit.
    ///
    /// The back-reference is write-once; linking an already-linked edit is an
    /// operation error.
    async fn link_edit_to_article(&self, edit_id: &str, article_id: &str) -> StorageResult<()>;

    /// List learning edits matching a filter, newest first
    async fn list_edits(
        &self,
        filter: LearningEditFilter,
        limit: Option<usize>,
    ) -> StorageResult<Vec<LearningEdit>>;

    /// Find a recurring issue by exact normalized pattern
    async fn find_issue_by_pattern(&self, pattern: &str) -> StorageResult<Option<RecurringIssue>>;

    /// Create a recurring issue record
    async fn create_issue(&self, issue: RecurringIssue) -> StorageResult<RecurringIssue>;

    /// Update a recurring issue record
    async fn update_issue(&self, issue: RecurringIssue) -> StorageResult<RecurringIssue>;

    /// List recurring issues matching a filter
    async fn list_issues(&self, filter: IssueFilter) -> StorageResult<Vec<RecurringIssue>>;

    /// Append a usage log entry (never mutated afterwards)
    async fn append_usage(&self, log: UsageLog) -> StorageResult<UsageLog>;

    /// List usage log entries for an article, oldest first
    async fn list_usage(&self, article_id: &str) -> StorageResult<Vec<UsageLog>>;
}

/// Combined storage interface the knowledge base operates against
pub trait KbStore: ArticleStore + LearningStore {}

impl<T: ArticleStore + LearningStore> KbStore for T {}
