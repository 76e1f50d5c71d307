//! Observability sink: one record per routed request.
//!
//! Observers are fire-and-forget: the engine logs a failing observer and
//! carries on with the routing result unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::ObserverError;
use crate::routing::RouteSource;

/// What happened to a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    pub timestamp: DateTime<Utc>,

    /// Resolved agent, or `None` when the selector abstained
    pub agent_id: Option<String>,

    pub source: Option<RouteSource>,
    pub meta: bool,
    pub route_cache_hit: bool,
    pub session_cache_hit: bool,
    pub abstained: bool,
    pub degraded: bool,
    pub skill_ids: Vec<String>,
    pub implant_ids: Vec<String>,
    pub latency_ms: u64,
}

impl RouteRecord {
    /// A record with every flag cleared, stamped now.
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            agent_id: None,
            source: None,
            meta: false,
            route_cache_hit: false,
            session_cache_hit: false,
            abstained: false,
            degraded: false,
            skill_ids: Vec::new(),
            implant_ids: Vec::new(),
            latency_ms: 0,
        }
    }
}

impl Default for RouteRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives route records.
pub trait RouteObserver: Send + Sync {
    fn name(&self) -> &str;

    fn observe(&self, record: &RouteRecord) -> std::result::Result<(), ObserverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_blank() {
        let record = RouteRecord::new();
        assert!(record.agent_id.is_none());
        assert!(!record.route_cache_hit && !record.session_cache_hit && !record.abstained);
        assert!(record.skill_ids.is_empty());
    }
}
