//! Observability sink for skillroute.
//!
//! Keeps a bounded history of routed requests and running counters
//! (per-source resolutions, cache hits, abstentions, degraded retrievals,
//! latency) and serves them as a snapshot. Fire-and-forget: recording never
//! influences a routing decision.

pub mod model;
pub mod recorder;

pub use model::{AgentCount, RouteStats, SourceCounts, TracedRoute};
pub use recorder::RouteRecorder;
