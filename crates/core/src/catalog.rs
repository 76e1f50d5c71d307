//! Catalog entries: agents, skills, and implants.
//!
//! Entries are built once from definition files and never mutated afterwards;
//! a re-index replaces the whole catalog. Each entry carries a closed,
//! variant-specific profile instead of an untyped metadata map, so every
//! consumer sees fields that were validated at load time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The three independent collections held by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Agents,
    Skills,
    Implants,
}

impl Collection {
    /// All collections, in index order.
    pub const ALL: [Collection; 3] = [Collection::Agents, Collection::Skills, Collection::Implants];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Skills => "skills",
            Self::Implants => "implants",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing and enrichment profile of an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Human-readable name (falls back to the id)
    pub display_name: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub tone: String,

    #[serde(default)]
    pub description: String,

    /// Keywords matched against the query by the selector
    #[serde(default)]
    pub domain_keywords: Vec<String>,

    /// Explicit trigger token such as `/dev`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_command: Option<String>,

    #[serde(default)]
    pub file_globs: Vec<String>,

    #[serde(default)]
    pub always_apply: bool,

    /// Ordered skill ids used when retrieval is unavailable
    #[serde(default)]
    pub static_skill_ids: Vec<String>,

    /// Ordered implant ids used when retrieval is unavailable
    #[serde(default)]
    pub static_implant_ids: Vec<String>,

    #[serde(default)]
    pub preferred_skill_ids: Vec<String>,

    #[serde(default)]
    pub preferred_implant_ids: Vec<String>,
}

impl AgentProfile {
    /// Static fallback list for a fragment collection.
    pub fn static_ids(&self, collection: Collection) -> &[String] {
        match collection {
            Collection::Skills => &self.static_skill_ids,
            Collection::Implants => &self.static_implant_ids,
            Collection::Agents => &[],
        }
    }

    /// Preference (bias) list for a fragment collection.
    pub fn preferred_ids(&self, collection: Collection) -> &[String] {
        match collection {
            Collection::Skills => &self.preferred_skill_ids,
            Collection::Implants => &self.preferred_implant_ids,
            Collection::Agents => &[],
        }
    }

    /// Whether the query's first token is this agent's trigger command.
    pub fn is_triggered_by(&self, query: &str) -> bool {
        let Some(trigger) = self.trigger_command.as_deref() else {
            return false;
        };
        let trigger = trigger.trim();
        if trigger.is_empty() {
            return false;
        }
        query
            .split_whitespace()
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case(trigger))
    }
}

/// Profile shared by skills and implants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentProfile {
    pub description: String,

    #[serde(default)]
    pub globs: Vec<String>,

    #[serde(default)]
    pub always_apply: bool,
}

/// The closed set of entry variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    Agent(AgentProfile),
    Skill(FragmentProfile),
    Implant(FragmentProfile),
}

/// A single catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable id: directory name for agents, file stem for fragments
    pub id: String,

    /// Full body text (imports already expanded for agents)
    pub text: String,

    /// Variant-specific metadata
    pub kind: EntryKind,

    /// Definition file the entry was loaded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Embedding, attached at index time
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl CatalogEntry {
    pub fn collection(&self) -> Collection {
        match self.kind {
            EntryKind::Agent(_) => Collection::Agents,
            EntryKind::Skill(_) => Collection::Skills,
            EntryKind::Implant(_) => Collection::Implants,
        }
    }

    pub fn as_agent(&self) -> Option<&AgentProfile> {
        match &self.kind {
            EntryKind::Agent(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn description(&self) -> &str {
        match &self.kind {
            EntryKind::Agent(profile) => &profile.description,
            EntryKind::Skill(profile) | EntryKind::Implant(profile) => &profile.description,
        }
    }

    /// The text that represents this entry in embedding space.
    ///
    /// Agents are embedded by identity and keywords rather than their full
    /// prompt; fragments by description plus body.
    pub fn embedding_text(&self) -> String {
        match &self.kind {
            EntryKind::Agent(profile) => format!(
                "{}\n{}\n{}\n{}",
                profile.display_name,
                profile.role,
                profile.description,
                profile.domain_keywords.join(", ")
            ),
            EntryKind::Skill(profile) | EntryKind::Implant(profile) => {
                format!("{}\n\n{}", profile.description, self.text)
            }
        }
    }
}

/// Normalise a fragment reference: `skill-debugging.mdc` → `skill-debugging`.
pub fn normalize_fragment_id(reference: &str) -> String {
    let trimmed = reference.trim();
    trimmed.strip_suffix(".mdc").unwrap_or(trimmed).to_string()
}
