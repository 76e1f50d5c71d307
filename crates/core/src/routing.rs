//! Routing outcome types.
//!
//! A routed query either resolves to an agent with an assembled prompt or
//! abstains with a ranked candidate list for the host to pick from.
//! Abstention is a value, never an error.

use serde::{Deserialize, Serialize};

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Trivial query short-circuited to the default agent
    Meta,
    /// Explicit trigger token such as `/dev`
    Trigger,
    /// Semantic route cache hit
    RouteCache,
    /// Agent selector cleared the confidence bar
    Selector,
    /// The host picked after an abstention
    Host,
}

impl RouteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Trigger => "trigger",
            Self::RouteCache => "route_cache",
            Self::Selector => "selector",
            Self::Host => "host",
        }
    }
}

impl std::fmt::Display for RouteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored id produced during selection or retrieval. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub entry_id: String,
    pub score: f32,
}

impl RankedCandidate {
    pub fn new(entry_id: impl Into<String>, score: f32) -> Self {
        Self { entry_id: entry_id.into(), score }
    }
}

/// A resolved route with its enriched prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub agent_id: String,
    pub confidence: f32,
    pub source: RouteSource,
    pub composite_prompt: String,
    pub skill_ids: Vec<String>,
    pub implant_ids: Vec<String>,

    /// Detected non-default language (ISO 639-3), if a directive was injected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    pub session_cache_hit: bool,

    /// Retrieval fell back to static lists
    #[serde(default)]
    pub degraded: bool,
}

/// Result of routing one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Resolved(Resolution),
    Abstained {
        /// Ranked descending by score
        candidates: Vec<RankedCandidate>,
        default_fallback: String,
    },
}

impl Outcome {
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            Self::Abstained { .. } => None,
        }
    }

    pub fn is_abstained(&self) -> bool {
        matches!(self, Self::Abstained { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = Outcome::Abstained {
            candidates: vec![RankedCandidate::new("data_analyst", 0.42)],
            default_fallback: "universal_agent".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "ABSTAINED");
        assert_eq!(json["candidates"][0]["entry_id"], "data_analyst");
        assert!(outcome.is_abstained());
        assert!(outcome.resolution().is_none());
    }

    #[test]
    fn resolved_omits_absent_language() {
        let outcome = Outcome::Resolved(Resolution {
            agent_id: "software_engineer".into(),
            confidence: 1.0,
            source: RouteSource::Trigger,
            composite_prompt: "base".into(),
            skill_ids: vec![],
            implant_ids: vec![],
            language: None,
            session_cache_hit: false,
            degraded: false,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "RESOLVED");
        assert_eq!(json["source"], "trigger");
        assert!(json.get("language").is_none());
    }
}
