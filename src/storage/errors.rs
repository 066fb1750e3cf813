//! Error types for storage operations

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Operation error
    #[error("Operation error: {0}")]
    Operation(String),

    /// Data not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Item already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
