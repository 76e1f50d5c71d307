//! Session prompt cache: memoised enrichment per (scope, agent, normalised query).
//!
//! Lives for the process. Keys are a SHA-256 over the enrichment scope, the
//! agent id and the normalised query, so queries differing only in case or
//! spacing share an entry while a meta prompt never stands in for a full one. The lock is never held across the compute future: read, compute,
//! then write. A poisoned lock degrades to computing without storing.

use sha2::{Digest, Sha256};
use skillroute_core::text::normalize_query;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::RwLock;
use tracing::{debug, warn};

/// An assembled prompt plus what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub composite_prompt: String,
    pub skill_ids: Vec<String>,
    pub implant_ids: Vec<String>,
    /// ISO 639-3 code of an injected language directive
    pub language: Option<String>,
    pub degraded: bool,
}

/// Which assembly produced an enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentScope {
    /// Base prompt, retrieved skills and implants, language directive
    Full,
    /// Base prompt and language directive only
    Meta,
}

impl EnrichmentScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Meta => "meta",
        }
    }
}

/// Deterministic cache key for a scope, agent and query.
pub fn session_key(scope: EnrichmentScope, agent_id: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(agent_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(normalize_query(query).as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Enrichment>,
    order: VecDeque<String>,
}

pub struct SessionPromptCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl SessionPromptCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, scope: EnrichmentScope, agent_id: &str, query: &str) -> Option<Enrichment> {
        let key = session_key(scope, agent_id, query);
        match self.inner.read() {
            Ok(inner) => inner.entries.get(&key).cloned(),
            Err(_) => {
                warn!("Session cache lock poisoned; treating as miss");
                None
            }
        }
    }

    /// The cached enrichment, or `compute`'s result stored for next time.
    ///
    /// Returns the enrichment and whether it was a hit.
    pub async fn get_or_compute<F, Fut>(
        &self,
        scope: EnrichmentScope,
        agent_id: &str,
        query: &str,
        compute: F,
    ) -> (Enrichment, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Enrichment>,
    {
        let key = session_key(scope, agent_id, query);

        let cached = match self.inner.read() {
            Ok(inner) => inner.entries.get(&key).cloned(),
            Err(_) => {
                warn!("Session cache lock poisoned; treating as miss");
                None
            }
        };
        if let Some(hit) = cached {
            debug!(agent = agent_id, scope = scope.as_str(), "Session cache hit");
            return (hit, true);
        }

        let computed = compute().await;

        let Ok(mut inner) = self.inner.write() else {
            warn!("Session cache lock poisoned; result not stored");
            return (computed, false);
        };
        // Another request may have filled the slot while we computed.
        if let Some(existing) = inner.entries.get(&key) {
            return (existing.clone(), false);
        }
        inner.entries.insert(key.clone(), computed.clone());
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        (computed, false)
    }

    /// Drop every entry; returns how many were removed.
    pub fn clear(&self) -> usize {
        match self.inner.write() {
            Ok(mut inner) => {
                let removed = inner.entries.len();
                inner.entries.clear();
                inner.order.clear();
                removed
            }
            Err(_) => {
                warn!("Session cache lock poisoned; nothing cleared");
                0
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
