//! Data model for recorded routes and the aggregate snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillroute_core::{RouteRecord, RouteSource};
use uuid::Uuid;

// ── Traced route ──────────────────────────────────────────────────────────

/// A route record with a request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracedRoute {
    pub request_id: String,
    #[serde(flatten)]
    pub record: RouteRecord,
}

impl TracedRoute {
    pub fn new(record: RouteRecord) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            record,
        }
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────

/// Requests resolved per source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub meta: u64,
    pub trigger: u64,
    pub route_cache: u64,
    pub selector: u64,
    pub host: u64,
}

impl SourceCounts {
    pub(crate) fn bump(&mut self, source: RouteSource) {
        match source {
            RouteSource::Meta => self.meta += 1,
            RouteSource::Trigger => self.trigger += 1,
            RouteSource::RouteCache => self.route_cache += 1,
            RouteSource::Selector => self.selector += 1,
            RouteSource::Host => self.host += 1,
        }
    }
}

/// How often an agent was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCount {
    pub agent_id: String,
    pub requests: u64,
}

/// Aggregate counters since start (or the last reset).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteStats {
    pub requests: u64,
    pub resolved: u64,
    pub abstained: u64,
    pub by_source: SourceCounts,
    pub route_cache_hits: u64,
    pub session_cache_hits: u64,
    pub degraded: u64,
    pub avg_latency_ms: f64,
    /// Most requested first
    pub top_agents: Vec<AgentCount>,
    /// Records currently held in history
    pub history_len: usize,
    pub since: Option<DateTime<Utc>>,
}

impl RouteStats {
    /// Route cache hits over requests that reached the cache.
    pub fn route_cache_hit_rate(&self) -> f64 {
        let eligible = self.requests - self.by_source.meta - self.by_source.trigger - self.by_source.host;
        if eligible == 0 {
            0.0
        } else {
            self.route_cache_hits as f64 / eligible as f64
        }
    }

    pub fn session_cache_hit_rate(&self) -> f64 {
        if self.resolved == 0 {
            0.0
        } else {
            self.session_cache_hits as f64 / self.resolved as f64
        }
    }
}
