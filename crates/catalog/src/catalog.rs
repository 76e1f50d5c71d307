//! Vector catalog adapter: the read side of the three collections.
//!
//! A `Catalog` is built once from loaded entries and never mutated; a
//! re-index builds a new one. Entry text and metadata live here, vectors
//! live in the `VectorStore`.

use skillroute_core::error::{EmbeddingError, StoreError};
use skillroute_core::{CatalogEntry, Collection, Embedder, ScoredId, VectorStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Whether indexing rebuilds the store or reuses existing vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Clear the store and embed everything
    Rebuild,
    /// Embed a collection only if the store holds nothing for it
    IfEmpty,
}

/// What an indexing pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub agents: usize,
    pub skills: usize,
    pub implants: usize,
    /// Entries whose embedding failed and were left out of the store
    pub failed: usize,
    /// Collections whose existing vectors were kept
    pub reused: Vec<Collection>,
}

/// Embed entries and upsert them into `store`.
///
/// Agent embeddings are always computed and attached to the entries, since
/// the selector reads them from the catalog. An embedding failure on one
/// entry is logged and leaves that entry unembedded.
pub async fn index_entries(
    entries: &mut [CatalogEntry],
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    mode: IndexMode,
) -> Result<IndexSummary, StoreError> {
    let mut summary = IndexSummary::default();

    if mode == IndexMode::Rebuild {
        store.clear().await?;
    }

    for collection in Collection::ALL {
        let reuse = mode == IndexMode::IfEmpty
            && collection != Collection::Agents
            && store.count(collection).await? > 0;
        if reuse {
            summary.reused.push(collection);
        }

        for entry in entries.iter_mut().filter(|e| e.collection() == collection) {
            if reuse {
                continue;
            }
            let vector = match embedder.embed(&entry.embedding_text()).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(id = %entry.id, %collection, error = %e, "Embedding failed; entry not indexed");
                    summary.failed += 1;
                    continue;
                }
            };
            store.upsert(collection, &entry.id, vector.clone()).await?;
            if collection == Collection::Agents {
                entry.embedding = Some(vector);
            }
            match collection {
                Collection::Agents => summary.agents += 1,
                Collection::Skills => summary.skills += 1,
                Collection::Implants => summary.implants += 1,
            }
        }
    }

    store.flush().await?;
    info!(
        agents = summary.agents,
        skills = summary.skills,
        implants = summary.implants,
        failed = summary.failed,
        store = store.name(),
        "Catalog indexed"
    );
    Ok(summary)
}

/// Immutable catalog of agents, skills, and implants.
pub struct Catalog {
    agents: Vec<CatalogEntry>,
    fragments: HashMap<Collection, HashMap<String, CatalogEntry>>,
    store: Arc<dyn VectorStore>,
    store_timeout: Duration,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>, store: Arc<dyn VectorStore>, store_timeout: Duration) -> Self {
        let mut agents = Vec::new();
        let mut fragments: HashMap<Collection, HashMap<String, CatalogEntry>> = HashMap::new();

        for entry in entries {
            match entry.collection() {
                Collection::Agents => agents.push(entry),
                collection => {
                    fragments.entry(collection).or_default().insert(entry.id.clone(), entry);
                }
            }
        }
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents.dedup_by(|a, b| a.id == b.id);

        Self {
            agents,
            fragments,
            store,
            store_timeout,
        }
    }

    /// Agents sorted by id.
    pub fn agents(&self) -> &[CatalogEntry] {
        &self.agents
    }

    pub fn agent(&self, id: &str) -> Option<&CatalogEntry> {
        self.agents
            .binary_search_by(|a| a.id.as_str().cmp(id))
            .ok()
            .map(|pos| &self.agents[pos])
    }

    pub fn has_agent(&self, id: &str) -> bool {
        self.agent(id).is_some()
    }

    /// A skill or implant by id.
    pub fn fragment(&self, collection: Collection, id: &str) -> Option<&CatalogEntry> {
        self.fragments.get(&collection)?.get(id)
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Agents => self.agents.len(),
            other => self.fragments.get(&other).map_or(0, HashMap::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|c| self.len(*c) == 0)
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub async fn indexed_count(&self, collection: Collection) -> Result<usize, StoreError> {
        self.store.count(collection).await
    }

    /// Nearest ids in `collection`, bounded by the store timeout.
    pub async fn nearest(
        &self,
        collection: Collection,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredId>, StoreError> {
        match tokio::time::timeout(self.store_timeout, self.store.query(collection, vector, k)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout.as_millis() as u64)),
        }
    }
}

/// Embed `text` with a deadline; a timeout is an `EmbeddingError`.
pub async fn embed_with_timeout(
    embedder: &dyn Embedder,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>, EmbeddingError> {
    match tokio::time::timeout(timeout, embedder.embed(text)).await {
        Ok(result) => result,
        Err(_) => Err(EmbeddingError::Timeout(timeout.as_millis() as u64)),
    }
}
