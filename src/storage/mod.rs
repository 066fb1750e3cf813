//! Storage abstraction for the knowledge base.
//!
//! The subsystem never talks to a database directly; everything goes through
//! the [`KbStore`] trait object injected at construction time. The bundled
//! [`InMemoryKbStore`] doubles as the test fake and the reference
//! implementation of client-side filtering.

pub mod errors;
pub mod filters;
pub mod memory;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use filters::{ArticleFilter, IssueFilter, LearningEditFilter};
pub use memory::InMemoryKbStore;
pub use traits::{ArticleStore, BaseStore, KbStore, LearningStore};
