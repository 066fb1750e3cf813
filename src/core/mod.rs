//! Core service composition.

mod manager;

pub use manager::KnowledgeManager;
