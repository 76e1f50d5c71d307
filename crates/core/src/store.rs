//! Vector store trait: nearest-neighbour lookup per collection.
//!
//! The store holds only `(id, vector)` pairs; entry text and metadata stay
//! with the catalog that owns them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::catalog::Collection;
use crate::error::StoreError;

/// An id with its cosine distance to the query (0 = identical).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredId {
    pub id: String,
    pub distance: f32,
}

impl ScoredId {
    /// Cosine similarity corresponding to the distance.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// The core VectorStore trait.
///
/// Implementations: in-memory, JSON-lines file.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Insert or replace the vector stored under `id`.
    async fn upsert(
        &self,
        collection: Collection,
        id: &str,
        vector: Vec<f32>,
    ) -> std::result::Result<(), StoreError>;

    /// The `k` nearest ids, ascending by cosine distance.
    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<ScoredId>, StoreError>;

    /// Number of vectors in a collection.
    async fn count(&self, collection: Collection) -> std::result::Result<usize, StoreError>;

    /// Drop every vector in every collection.
    async fn clear(&self) -> std::result::Result<(), StoreError>;

    /// Persist pending writes. No-op for volatile stores.
    async fn flush(&self) -> std::result::Result<(), StoreError> {
        Ok(())
    }
}
