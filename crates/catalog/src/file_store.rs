//! File-backed vector store: persistent JSON-lines storage.
//!
//! Each line is one `{collection, id, vector}` record. Vectors are loaded into
//! memory on open; writes stay in memory until `flush`, which rewrites the
//! whole file. A re-index therefore replaces the file rather than patching it.
//!
//! Storage location: `~/.skillroute/index.jsonl`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillroute_core::error::StoreError;
use skillroute_core::{Collection, ScoredId, VectorStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::in_memory::{Collections, query_in, upsert_into};

#[derive(Debug, Serialize, Deserialize)]
struct IndexRecord {
    collection: Collection,
    id: String,
    vector: Vec<f32>,
}

/// A file-backed vector store using JSONL (one JSON object per line).
pub struct FileVectorStore {
    path: PathBuf,
    collections: Arc<RwLock<Collections>>,
}

impl FileVectorStore {
    /// Open the store at `path`.
    ///
    /// If the file exists, vectors are loaded from it; corrupt lines are
    /// skipped. If it does not exist, the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let collections = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            count = collections.values().map(Vec::len).sum::<usize>(),
            "File vector store loaded"
        );
        Self {
            path,
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(path: &Path) -> Collections {
        let mut collections = HashMap::new();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return collections,
        };

        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str::<IndexRecord>(line) {
                Ok(record) => upsert_into(&mut collections, record.collection, &record.id, record.vector),
                Err(e) => warn!(error = %e, "Skipping corrupted index record"),
            }
        }
        collections
    }

    async fn write_to_disk(&self) -> Result<(), StoreError> {
        let collections = self.collections.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Storage(format!("Failed to create index directory: {e}")))?;
        }

        let mut content = String::new();
        for collection in Collection::ALL {
            let Some(rows) = collections.get(&collection) else {
                continue;
            };
            for (id, vector) in rows {
                let record = IndexRecord {
                    collection,
                    id: id.clone(),
                    vector: vector.clone(),
                };
                let line = serde_json::to_string(&record)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                content.push_str(&line);
                content.push('\n');
            }
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write index file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn name(&self) -> &str {
        "file"
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
        self.write_to_disk().await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.write_to_disk().await
    }
}
