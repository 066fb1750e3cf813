//! Embedding gateway: converts text into fixed-length vectors.
//!
//! The knowledge base treats the embedding service as an opaque, injected
//! dependency behind [`EmbeddingProvider`]. A reqwest-based client for
//! OpenAI-compatible endpoints lives in [`remote`]; [`hashing`] provides a
//! deterministic offline implementation for tests and air-gapped setups.

pub mod hashing;
pub mod remote;

use std::fmt::Debug;

use async_trait::async_trait;

pub use hashing::HashingEmbedder;
pub use remote::RemoteEmbeddingClient;

/// Type for embedding vectors
pub type EmbeddingVector = Vec<f32>;

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The request to the embedding service failed
    #[error("Embedding request failed: {0}")]
    Request(String),

    /// The embedding service did not respond within the caller's timeout
    #[error("Embedding request timed out: {0}")]
    Timeout(String),

    /// The service returned a response the client could not interpret
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    /// The returned vector did not have the configured dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type for embedding operations
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Interface for services that generate vector representations of text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// The fixed length of vectors this provider produces
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Generate embeddings for a batch of texts.
    ///
    /// The default implementation embeds sequentially; callers that need
    /// rate limiting add their own inter-request delay.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Cosine similarity between two vectors.
///
/// Mismatched dimensions, empty vectors, and zero-norm vectors all yield
/// 0.0 rather than an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum();
    let a_norm: f32 = a.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let b_norm: f32 = b.iter().map(|&x| x * x).sum::<f32>().sqrt();

    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }

    dot / (a_norm * b_norm)
}
