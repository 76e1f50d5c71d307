//! In-process route recorder: bounded history plus running counters.
//!
//! Implements [`RouteObserver`], so the routing engine feeds it directly.
//! Thread-safe via `RwLock`; a poisoned lock rejects the record instead of
//! panicking, and the engine logs and moves on.

use crate::model::{AgentCount, RouteStats, SourceCounts, TracedRoute};
use chrono::{DateTime, Utc};
use skillroute_config::TelemetryConfig;
use skillroute_core::error::ObserverError;
use skillroute_core::{RouteObserver, RouteRecord};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::debug;

/// Internal running totals.
#[derive(Debug, Default)]
struct RunningTotals {
    requests: u64,
    resolved: u64,
    abstained: u64,
    by_source: SourceCounts,
    route_cache_hits: u64,
    session_cache_hits: u64,
    degraded: u64,
    total_latency_ms: u64,
    per_agent: HashMap<String, u64>,
    since: Option<DateTime<Utc>>,
}

pub struct RouteRecorder {
    /// Most recent last
    history: RwLock<VecDeque<TracedRoute>>,
    history_limit: usize,
    totals: RwLock<RunningTotals>,
}

impl RouteRecorder {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: RwLock::new(VecDeque::new()),
            history_limit,
            totals: RwLock::new(RunningTotals::default()),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.history)
    }

    /// Record one request; returns the assigned request id.
    pub fn record(&self, record: &RouteRecord) -> Result<String, ObserverError> {
        let traced = TracedRoute::new(record.clone());
        let request_id = traced.request_id.clone();

        {
            let mut totals = self.totals.write().map_err(|_| poisoned())?;
            totals.since.get_or_insert(record.timestamp);
            totals.requests += 1;
            totals.total_latency_ms += record.latency_ms;
            if record.abstained {
                totals.abstained += 1;
            }
            if let Some(source) = record.source {
                totals.resolved += 1;
                totals.by_source.bump(source);
            }
            if record.route_cache_hit {
                totals.route_cache_hits += 1;
            }
            if record.session_cache_hit {
                totals.session_cache_hits += 1;
            }
            if record.degraded {
                totals.degraded += 1;
            }
            if let Some(agent) = &record.agent_id {
                *totals.per_agent.entry(agent.clone()).or_default() += 1;
            }
        }

        if self.history_limit > 0 {
            let mut history = self.history.write().map_err(|_| poisoned())?;
            history.push_back(traced);
            while history.len() > self.history_limit {
                history.pop_front();
            }
        }

        debug!(request_id = %request_id, agent = ?record.agent_id, "Route recorded");
        Ok(request_id)
    }

    /// Most recent first.
    pub fn recent(&self, limit: usize) -> Vec<TracedRoute> {
        self.history
            .read()
            .map(|h| h.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> RouteStats {
        let history_len = self.history.read().map(|h| h.len()).unwrap_or(0);
        let Ok(totals) = self.totals.read() else {
            return RouteStats::default();
        };

        let mut top_agents: Vec<AgentCount> = totals
            .per_agent
            .iter()
            .map(|(agent_id, requests)| AgentCount {
                agent_id: agent_id.clone(),
                requests: *requests,
            })
            .collect();
        top_agents.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.agent_id.cmp(&b.agent_id)));

        RouteStats {
            requests: totals.requests,
            resolved: totals.resolved,
            abstained: totals.abstained,
            by_source: totals.by_source.clone(),
            route_cache_hits: totals.route_cache_hits,
            session_cache_hits: totals.session_cache_hits,
            degraded: totals.degraded,
            avg_latency_ms: if totals.requests == 0 {
                0.0
            } else {
                totals.total_latency_ms as f64 / totals.requests as f64
            },
            top_agents,
            history_len,
            since: totals.since,
        }
    }

    /// Forget all history and counters.
    pub fn reset(&self) {
        if let Ok(mut history) = self.history.write() {
            history.clear();
        }
        if let Ok(mut totals) = self.totals.write() {
            *totals = RunningTotals::default();
        }
    }
}

impl Default for RouteRecorder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RouteObserver for RouteRecorder {
    fn name(&self) -> &str {
        "route_recorder"
    }

    fn observe(&self, record: &RouteRecord) -> Result<(), ObserverError> {
        self.record(record).map(|_| ())
    }
}

fn poisoned() -> ObserverError {
    ObserverError::Rejected {
        name: "route_recorder".into(),
        reason: "lock poisoned".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillroute_core::RouteSource;

    fn resolved(agent: &str, source: RouteSource) -> RouteRecord {
        RouteRecord {
            agent_id: Some(agent.into()),
            source: Some(source),
            latency_ms: 10,
            ..RouteRecord::new()
        }
    }

    #[test]
    fn counters_follow_records() {
        let recorder = RouteRecorder::new(16);

        recorder.record(&resolved("universal_agent", RouteSource::Meta)).unwrap();
        let mut hit = resolved("software_engineer", RouteSource::RouteCache);
        hit.route_cache_hit = true;
        hit.session_cache_hit = true;
        recorder.record(&hit).unwrap();
        recorder
            .record(&RouteRecord {
                abstained: true,
                latency_ms: 40,
                ..RouteRecord::new()
            })
            .unwrap();

        let stats = recorder.stats();
        assert_eq!(stats.requests, 3);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.abstained, 1);
        assert_eq!(stats.by_source.meta, 1);
        assert_eq!(stats.by_source.route_cache, 1);
        assert_eq!(stats.route_cache_hits, 1);
        assert_eq!(stats.session_cache_hits, 1);
        assert!((stats.avg_latency_ms - 20.0).abs() < f64::EPSILON);
        assert!(stats.since.is_some());
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let recorder = RouteRecorder::new(2);
        for agent in ["a", "b", "c"] {
            recorder.record(&resolved(agent, RouteSource::Selector)).unwrap();
        }

        let recent = recorder.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].record.agent_id.as_deref(), Some("c"));
        assert_eq!(recent[1].record.agent_id.as_deref(), Some("b"));
        // counters keep everything
        assert_eq!(recorder.stats().requests, 3);
        assert_eq!(recorder.stats().history_len, 2);
    }

    #[test]
    fn zero_history_keeps_counters_only() {
        let recorder = RouteRecorder::new(0);
        recorder.record(&resolved("a", RouteSource::Host)).unwrap();
        assert!(recorder.recent(5).is_empty());
        assert_eq!(recorder.stats().by_source.host, 1);
    }

    #[test]
    fn top_agents_sorted_by_volume() {
        let recorder = RouteRecorder::default();
        for agent in ["writer", "data_analyst", "data_analyst", "software_engineer", "data_analyst", "writer"] {
            recorder.record(&resolved(agent, RouteSource::Selector)).unwrap();
        }
        let top = recorder.stats().top_agents;
        assert_eq!(top[0].agent_id, "data_analyst");
        assert_eq!(top[0].requests, 3);
        assert_eq!(top[1].agent_id, "writer");
        assert_eq!(top[2].agent_id, "software_engineer");
    }

    #[test]
    fn observer_records_and_reset_clears() {
        let recorder = RouteRecorder::new(8);
        let observer: &dyn RouteObserver = &recorder;
        observer.observe(&resolved("a", RouteSource::Trigger)).unwrap();
        assert_eq!(recorder.stats().requests, 1);

        recorder.reset();
        assert_eq!(recorder.stats().requests, 0);
        assert!(recorder.recent(1).is_empty());
        assert!(recorder.stats().since.is_none());
    }

    #[test]
    fn request_ids_are_returned() {
        let recorder = RouteRecorder::new(4);
        let id = recorder.record(&resolved("a", RouteSource::Meta)).unwrap();
        assert_eq!(recorder.recent(1)[0].request_id, id);
    }
}
