//! Semantic route cache: nearest-neighbour memo of past routing decisions.
//!
//! A lookup hits only when the nearest stored query embedding lies strictly
//! within [`LOOKUP_MAX_DISTANCE`] cosine distance. Only resolutions with
//! confidence strictly above [`INSERT_MIN_CONFIDENCE`] are written. Both
//! bounds are fixed.
//!
//! Capacity is bounded; the oldest insertion is evicted first. Inserting a
//! near-duplicate of an existing entry replaces it when the new confidence is
//! at least as high, and is dropped otherwise, so identical re-insertion never
//! grows the cache.

use skillroute_catalog::cosine_distance;
use std::collections::VecDeque;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Lookup bound: a hit requires distance `< 0.05` (similarity > 0.95).
pub const LOOKUP_MAX_DISTANCE: f32 = 0.05;

/// Insert bound: only confidence `> 0.8` is cached.
pub const INSERT_MIN_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct RouteCacheEntry {
    pub query_embedding: Vec<f32>,
    pub agent_id: String,
    pub confidence: f32,
    /// Monotonic insertion sequence
    pub inserted_at: u64,
}

/// A cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteHit {
    pub agent_id: String,
    pub confidence: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New entry written; `evicted` if the oldest entry made room
    Inserted { evicted: bool },
    /// A near-duplicate was replaced
    Superseded { previous_agent: String },
    /// A near-duplicate with higher confidence was kept instead
    KeptExisting,
    /// Confidence at or below the insert bound
    BelowThreshold,
    /// Lock poisoned; nothing written
    Unavailable,
}

impl InsertOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::Superseded { .. })
    }
}

#[derive(Default)]
struct Inner {
    entries: VecDeque<RouteCacheEntry>,
    next_seq: u64,
}

impl Inner {
    /// Index and distance of the nearest entry; ties go to the newest.
    fn nearest(&self, embedding: &[f32]) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32, u64)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let distance = cosine_distance(&entry.query_embedding, embedding);
            let better = match best {
                None => true,
                Some((_, d, seq)) => distance < d || (distance == d && entry.inserted_at > seq),
            };
            if better {
                best = Some((idx, distance, entry.inserted_at));
            }
        }
        best.map(|(idx, d, _)| (idx, d))
    }
}

pub struct SemanticRouteCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl SemanticRouteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn lookup(&self, query_embedding: &[f32]) -> Option<RouteHit> {
        let inner = match self.inner.read() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Route cache lock poisoned; treating lookup as miss");
                return None;
            }
        };

        let (idx, distance) = inner.nearest(query_embedding)?;
        if distance < LOOKUP_MAX_DISTANCE {
            let entry = &inner.entries[idx];
            debug!(agent = %entry.agent_id, distance, "Route cache hit");
            Some(RouteHit {
                agent_id: entry.agent_id.clone(),
                confidence: entry.confidence,
                distance,
            })
        } else {
            None
        }
    }

    pub fn insert(&self, query_embedding: Vec<f32>, agent_id: &str, confidence: f32) -> InsertOutcome {
        if !(confidence > INSERT_MIN_CONFIDENCE) {
            return InsertOutcome::BelowThreshold;
        }
        let confidence = confidence.min(1.0);

        let mut inner = match self.inner.write() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Route cache lock poisoned; skipping insert");
                return InsertOutcome::Unavailable;
            }
        };

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let entry = RouteCacheEntry {
            query_embedding,
            agent_id: agent_id.to_string(),
            confidence,
            inserted_at: seq,
        };

        if let Some((idx, distance)) = inner.nearest(&entry.query_embedding)
            && distance < LOOKUP_MAX_DISTANCE
        {
            if confidence < inner.entries[idx].confidence {
                return InsertOutcome::KeptExisting;
            }
            let previous = inner.entries.remove(idx).map(|e| e.agent_id).unwrap_or_default();
            inner.entries.push_back(entry);
            return InsertOutcome::Superseded {
                previous_agent: previous,
            };
        }

        inner.entries.push_back(entry);
        let evicted = inner.entries.len() > self.capacity;
        if evicted {
            inner.entries.pop_front();
        }
        InsertOutcome::Inserted { evicted }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
