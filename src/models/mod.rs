//! Data model types for the knowledge base

mod article;
mod learning;

pub use article::{Article, ArticleBuilder, ArticleCategory, ArticleSource, GradeSet};
pub use learning::{
    ChangeKind, EditMagnitude, LearningEdit, LearningType, RecurringIssue, ResolutionStatus,
    UsageLog, WordChange,
};
