//! Embedder trait: the abstraction over embedding providers.
//!
//! Implementations: local feature hashing, OpenAI-compatible HTTP endpoints.
//! Callers treat every failure as transient and fall back.

use async_trait::async_trait;
use crate::error::EmbeddingError;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// A human-readable name (e.g., "hashing", "openai").
    fn name(&self) -> &str;

    /// Length of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts. The default calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
