//! In-memory vector store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use skillroute_core::error::StoreError;
use skillroute_core::{Collection, ScoredId, VectorStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::vector::nearest;

/// Per-collection vectors, kept in id order for deterministic ties.
pub(crate) type Collections = HashMap<Collection, Vec<(String, Vec<f32>)>>;

pub(crate) fn upsert_into(collections: &mut Collections, collection: Collection, id: &str, vector: Vec<f32>) {
    let rows = collections.entry(collection).or_default();
    match rows.binary_search_by(|(existing, _)| existing.as_str().cmp(id)) {
        Ok(pos) => rows[pos].1 = vector,
        Err(pos) => rows.insert(pos, (id.to_string(), vector)),
    }
}

pub(crate) fn query_in(collections: &Collections, collection: Collection, vector: &[f32], k: usize) -> Vec<ScoredId> {
    match collections.get(&collection) {
        Some(rows) => nearest(rows.iter().map(|(id, v)| (id, v)), vector, k),
        None => Vec::new(),
    }
}

/// A vector store that keeps everything in process memory.
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn upsert(&self, collection: Collection, id: &str, vector: Vec<f32>) -> Result<(), StoreError> {
        upsert_into(&mut *self.collections.write().await, collection, id, vector);
        Ok(())
    }

    async fn query(&self, collection: Collection, vector: &[f32], k: usize) -> Result<Vec<ScoredId>, StoreError> {
        Ok(query_in(&*self.collections.read().await, collection, vector, k))
    }

    async fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.collections.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_and_query() {
        let store = InMemoryVectorStore::new();
        store.upsert(Collection::Skills, "skill-rust", vec![1.0, 0.0]).await.unwrap();
        store.upsert(Collection::Skills, "skill-sql", vec![0.0, 1.0]).await.unwrap();

        let hits = store.query(Collection::Skills, &[0.9, 0.1], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "skill-rust");
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = InMemoryVectorStore::new();
        store.upsert(Collection::Skills, "x", vec![1.0]).await.unwrap();

        assert_eq!(store.count(Collection::Skills).await.unwrap(), 1);
        assert_eq!(store.count(Collection::Implants).await.unwrap(), 0);
        assert!(store.query(Collection::Implants, &[1.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let store = InMemoryVectorStore::new();
        store.upsert(Collection::Agents, "a", vec![1.0, 0.0]).await.unwrap();
        store.upsert(Collection::Agents, "a", vec![0.0, 1.0]).await.unwrap();

        assert_eq!(store.count(Collection::Agents).await.unwrap(), 1);
        let hits = store.query(Collection::Agents, &[0.0, 1.0], 1).await.unwrap();
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn clear_all() {
        let store = InMemoryVectorStore::new();
        store.upsert(Collection::Skills, "a", vec![1.0]).await.unwrap();
        store.upsert(Collection::Implants, "b", vec![1.0]).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.count(Collection::Skills).await.unwrap(), 0);
        assert_eq!(store.count(Collection::Implants).await.unwrap(), 0);
    }
}
