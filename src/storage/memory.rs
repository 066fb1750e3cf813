//! In-memory knowledge base store.
//!
//! Used as the injected fake in tests and as the reference implementation of
//! client-side filtering: it evaluates every filter through the filters'
//! `matches` predicates, which backends with server-side filtering must agree
//! with exactly.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Article, LearningEdit, RecurringIssue, UsageLog};
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::filters::{ArticleFilter, IssueFilter, LearningEditFilter};
use crate::storage::traits::{ArticleStore, BaseStore, LearningStore};

/// In-memory store backed by `tokio::sync::RwLock` maps
#[derive(Debug, Default)]
pub struct InMemoryKbStore {
    articles: RwLock<HashMap<String, Article>>,
    edits: RwLock<HashMap<String, LearningEdit>>,
    issues: RwLock<HashMap<String, RecurringIssue>>,
    usage: RwLock<Vec<UsageLog>>,
}

impl InMemoryKbStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseStore for InMemoryKbStore {
    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn clear(&self) -> StorageResult<()> {
        self.articles.write().await.clear();
        self.edits.write().await.clear();
        self.issues.write().await.clear();
        self.usage.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for InMemoryKbStore {
    async fn create_article(&self, article: Article) -> StorageResult<Article> {
        let mut articles = self.articles.write().await;
        if articles.contains_key(&article.id) {
            return Err(StorageError::AlreadyExists(format!(
                "article {}",
                article.id
            )));
        }
        articles.insert(article.id.clone(), article.clone());
        Ok(article)
    }

    async fn get_article(&self, id: &str) -> StorageResult<Option<Article>> {
        Ok(self.articles.read().await.get(id).cloned())
    }

    async fn update_article(&self, article: Article) -> StorageResult<Article> {
        let mut articles = self.articles.write().await;
        if !articles.contains_key(&article.id) {
            return Err(StorageError::NotFound(format!("article {}", article.id)));
        }
        articles.insert(article.id.clone(), article.clone());
        Ok(article)
    }

    async fn list_articles(
        &self,
        filter: ArticleFilter,
        limit: Option<usize>,
    ) -> StorageResult<Vec<Article>> {
        let articles = self.articles.read().await;
        let mut matched: Vec<Article> = articles
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        // Deterministic ordering for callers and tests
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn count_articles(&self, filter: ArticleFilter) -> StorageResult<usize> {
        let articles = self.articles.read().await;
        Ok(articles.values().filter(|a| filter.matches(a)).count())
    }
}

#[async_trait]
impl LearningStore for InMemoryKbStore {
    async fn record_edit(&self, edit: LearningEdit) -> StorageResult<LearningEdit> {
        let mut edits = self.edits.write().await;
        if edits.contains_key(&edit.id) {
            return Err(StorageError::AlreadyExists(format!("edit {}", edit.id)));
        }
        edits.insert(edit.id.clone(), edit.clone());
        Ok(edit)
    }

    async fn get_edit(&self, id: &str) -> StorageResult<Option<LearningEdit>> {
        Ok(self.edits.read().await.get(id).cloned())
    }

    async fn link_edit_to_article(&self, edit_id: &str, article_id: &str) -> StorageResult<()> {
        let mut edits = self.edits.write().await;
        let edit = edits
            .get_mut(edit_id)
            .ok_or_else(|| StorageError::NotFound(format!("edit {}", edit_id)))?;
        if edit.article_id.is_some() {
            return Err(StorageError::Operation(format!(
                "edit {} is already linked to an article",
                edit_id
            )));
        }
        edit.article_id = Some(article_id.to_string());
        Ok(())
    }

    async fn list_edits(
        &self,
        filter: LearningEditFilter,
        limit: Option<usize>,
    ) -> StorageResult<Vec<LearningEdit>> {
        let edits = self.edits.read().await;
        let mut matched: Vec<LearningEdit> = edits
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn find_issue_by_pattern(&self, pattern: &str) -> StorageResult<Option<RecurringIssue>> {
        let issues = self.issues.read().await;
        Ok(issues.values().find(|i| i.pattern == pattern).cloned())
    }

    async fn create_issue(&self, issue: RecurringIssue) -> StorageResult<RecurringIssue> {
        let mut issues = self.issues.write().await;
        if issues.contains_key(&issue.id) {
            return Err(StorageError::AlreadyExists(format!("issue {}", issue.id)));
        }
        issues.insert(issue.id.clone(), issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, issue: RecurringIssue) -> StorageResult<RecurringIssue> {
        let mut issues = self.issues.write().await;
        if !issues.contains_key(&issue.id) {
            return Err(StorageError::NotFound(format!("issue {}", issue.id)));
        }
        issues.insert(issue.id.clone(), issue.clone());
        Ok(issue)
    }

    async fn list_issues(&self, filter: IssueFilter) -> StorageResult<Vec<RecurringIssue>> {
        let issues = self.issues.read().await;
        let mut matched: Vec<RecurringIssue> = issues
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.first_seen_at.cmp(&b.first_seen_at).then(a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn append_usage(&self, log: UsageLog) -> StorageResult<UsageLog> {
        self.usage.write().await.push(log.clone());
        Ok(log)
    }

    async fn list_usage(&self, article_id: &str) -> StorageResult<Vec<UsageLog>> {
        let usage = self.usage.read().await;
        Ok(usage
            .iter()
            .filter(|u| u.article_id == article_id)
            .cloned()
            .collect())
    }
}
