//! Definition file parser: `---` YAML header + markdown body → typed entry.
//!
//! Headers are deserialized into closed structs; a missing required field or
//! a YAML error rejects the whole file.

use serde::{Deserialize, Deserializer};
use skillroute_core::catalog::normalize_fragment_id;
use skillroute_core::error::CatalogError;
use skillroute_core::{AgentProfile, CatalogEntry, EntryKind, FragmentProfile};
use std::path::Path;

/// Split `---\n<header>\n---\n<body>` into (header, body).
///
/// Returns `None` when the content does not open with a fence or the
/// closing fence is missing.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let after_first_fence = content.strip_prefix("---")?;
    let end_fence = after_first_fence.find("\n---")?;
    let header = &after_first_fence[..end_fence];
    let rest = &after_first_fence[end_fence + 4..];
    // Drop the remainder of the closing fence line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => "",
    };
    Some((header.trim(), body.trim()))
}

/// Body with any frontmatter removed; content without a header is returned as-is.
pub fn strip_frontmatter(content: &str) -> &str {
    match split_frontmatter(content) {
        Some((_, body)) => body,
        None => content.trim(),
    }
}

#[derive(Debug, Deserialize)]
struct AgentHeader {
    identity: Identity,
    #[serde(default)]
    description: Option<String>,
    routing: Routing,
    #[serde(default)]
    context: ContextHeader,
    #[serde(default)]
    static_skills: Vec<String>,
    #[serde(default)]
    static_implants: Vec<String>,
    #[serde(default)]
    preferred_skills: Vec<String>,
    #[serde(default)]
    preferred_implants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Identity {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    tone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Routing {
    domain_keywords: Vec<String>,
    #[serde(default)]
    trigger_command: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContextHeader {
    #[serde(default, deserialize_with = "string_or_list")]
    file_globs: Vec<String>,
    #[serde(default, alias = "alwaysApply")]
    always_apply: bool,
}

#[derive(Debug, Deserialize)]
struct FragmentHeader {
    description: String,
    #[serde(default, deserialize_with = "string_or_list")]
    globs: Vec<String>,
    #[serde(default, alias = "alwaysApply")]
    always_apply: bool,
}

/// Accept `globs: "*.rs, *.toml"`, `globs: [..]`, or an empty value.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::One(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Raw::Many(v)) => v,
    })
}

fn malformed(path: &Path, reason: impl Into<String>) -> CatalogError {
    CatalogError::MalformedHeader {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn normalize_all(ids: Vec<String>) -> Vec<String> {
    ids.iter()
        .map(|id| normalize_fragment_id(id))
        .filter(|id| !id.is_empty())
        .collect()
}

/// Parse an agent definition. `body` is returned unexpanded; the loader
/// resolves imports afterwards.
pub fn parse_agent(id: &str, content: &str, path: &Path) -> Result<CatalogEntry, CatalogError> {
    let (header, body) = split_frontmatter(content).ok_or_else(|| malformed(path, "missing frontmatter"))?;
    let header: AgentHeader = serde_yaml::from_str(header).map_err(|e| malformed(path, e.to_string()))?;

    if header.identity.name.trim().is_empty() {
        return Err(malformed(path, "identity.name is empty"));
    }

    let display_name = header
        .identity
        .display_name
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| header.identity.name.clone());

    let profile = AgentProfile {
        display_name,
        role: header.identity.role.unwrap_or_default(),
        tone: header.identity.tone.unwrap_or_default(),
        description: header.description.unwrap_or_default(),
        domain_keywords: header
            .routing
            .domain_keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        trigger_command: header
            .routing
            .trigger_command
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        file_globs: header.context.file_globs,
        always_apply: header.context.always_apply,
        static_skill_ids: normalize_all(header.static_skills),
        static_implant_ids: normalize_all(header.static_implants),
        preferred_skill_ids: normalize_all(header.preferred_skills),
        preferred_implant_ids: normalize_all(header.preferred_implants),
    };

    Ok(CatalogEntry {
        id: id.to_string(),
        text: body.to_string(),
        kind: EntryKind::Agent(profile),
        source: Some(path.to_path_buf()),
        embedding: None,
    })
}

/// Which fragment collection a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Skill,
    Implant,
}

/// Parse a skill or implant definition.
pub fn parse_fragment(
    kind: FragmentKind,
    id: &str,
    content: &str,
    path: &Path,
) -> Result<CatalogEntry, CatalogError> {
    let (header, body) = split_frontmatter(content).ok_or_else(|| malformed(path, "missing frontmatter"))?;
    let header: FragmentHeader = serde_yaml::from_str(header).map_err(|e| malformed(path, e.to_string()))?;

    let profile = FragmentProfile {
        description: header.description.trim().to_string(),
        globs: header.globs,
        always_apply: header.always_apply,
    };

    let kind = match kind {
        FragmentKind::Skill => EntryKind::Skill(profile),
        FragmentKind::Implant => EntryKind::Implant(profile),
    };

    Ok(CatalogEntry {
        id: id.to_string(),
        text: body.to_string(),
        kind,
        source: Some(path.to_path_buf()),
        embedding: None,
    })
}
