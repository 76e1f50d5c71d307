//! Catalog lint: schema checks beyond what loading requires.
//!
//! Loading only rejects files it cannot use. Linting also flags problems
//! that load fine but route badly: dangling static skill ids, preference
//! lists written with file extensions, deprecated keys.

use serde::Serialize;
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::Path;

use crate::frontmatter::split_frontmatter;
use crate::loader::{agent_dirs, fragment_files};

/// Findings for one agent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentFindings {
    pub agent_id: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl AgentFindings {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Findings for the whole catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub agents: Vec<AgentFindings>,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.agents.iter().any(|a| !a.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_valid()).count()
    }
}

fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_mapping()?.get(key)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}

/// Check one agent header against the known skill ids.
pub fn lint_agent(agent_id: &str, content: &str, skill_ids: &HashSet<String>) -> AgentFindings {
    let mut findings = AgentFindings {
        agent_id: agent_id.to_string(),
        ..AgentFindings::default()
    };

    let Some((header, _)) = split_frontmatter(content) else {
        findings.errors.push("No frontmatter found".into());
        return findings;
    };

    let header: Value = match serde_yaml::from_str(header) {
        Ok(v) => v,
        Err(e) => {
            findings.errors.push(format!("Invalid YAML: {e}"));
            return findings;
        }
    };

    let has_name = get(&header, "identity")
        .and_then(|identity| get(identity, "name"))
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        findings.errors.push("Missing identity.name".into());
    }

    match get(&header, "routing").and_then(|routing| get(routing, "domain_keywords")) {
        Some(keywords) if keywords.is_sequence() => {}
        Some(_) => findings.errors.push("routing.domain_keywords must be an array".into()),
        None => findings.errors.push("Missing routing.domain_keywords".into()),
    }

    if get(&header, "skills").is_some() {
        findings.warnings.push(
            "DEPRECATED: 'skills' field should be removed (use 'static_skills' and 'preferred_skills')".into(),
        );
    }

    for key in ["static_skills", "static_implants", "preferred_skills", "preferred_implants"] {
        if let Some(value) = get(&header, key)
            && !value.is_sequence()
        {
            findings.errors.push(format!("{key} must be an array"));
        }
    }

    for skill in string_list(get(&header, "static_skills")) {
        let id = skill.strip_suffix(".mdc").unwrap_or(&skill);
        if !skill_ids.contains(id) {
            findings
                .warnings
                .push(format!("static_skills entry '{skill}' does not match any loaded skill"));
        }
    }

    for key in ["preferred_skills", "preferred_implants"] {
        for id in string_list(get(&header, key)) {
            if id.ends_with(".mdc") {
                findings
                    .warnings
                    .push(format!("{key} entry '{id}' should NOT include .mdc extension"));
            }
        }
    }

    findings
}

/// Lint every agent under `root`.
pub fn lint_catalog(root: &Path) -> LintReport {
    let skill_ids: HashSet<String> = fragment_files(&root.join("skills"))
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    let agents = agent_dirs(root)
        .into_iter()
        .map(|(id, path)| match std::fs::read_to_string(&path) {
            Ok(content) => lint_agent(&id, &content, &skill_ids),
            Err(e) => AgentFindings {
                agent_id: id,
                errors: vec![format!("Failed to read {}: {e}", path.display())],
                warnings: vec![],
            },
        })
        .collect();

    LintReport { agents }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fixtures;

    fn skills(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_agent_has_no_findings() {
        let content = "---\nidentity:\n  name: dev\nrouting:\n  domain_keywords: [code]\nstatic_skills: [skill-a.mdc]\npreferred_skills: [skill-a]\n---\nbody";
        let findings = lint_agent("dev", content, &skills(&["skill-a"]));
        assert!(findings.is_valid());
        assert!(findings.warnings.is_empty(), "{:?}", findings.warnings);
    }

    #[test]
    fn missing_required_fields_are_errors() {
        let content = "---\nidentity:\n  role: x\n---\nbody";
        let findings = lint_agent("x", content, &skills(&[]));
        assert_eq!(
            findings.errors,
            ["Missing identity.name", "Missing routing.domain_keywords"]
        );
    }

    #[test]
    fn warnings_for_dangling_and_extension_ids() {
        let content = "---\nidentity:\n  name: dev\nrouting:\n  domain_keywords: []\nskills: [old]\nstatic_skills: [skill-gone]\npreferred_implants: [implant-x.mdc]\n---\nbody";
        let findings = lint_agent("dev", content, &skills(&[]));
        assert!(findings.is_valid());
        assert_eq!(findings.warnings.len(), 3);
        assert!(findings.warnings[0].starts_with("DEPRECATED"));
    }

    #[test]
    fn no_frontmatter_is_error() {
        let findings = lint_agent("x", "plain text", &skills(&[]));
        assert!(!findings.is_valid());
    }

    #[test]
    fn lint_catalog_reports_each_agent() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::agent(dir.path(), "good", "a", "", "ok");
        fixtures::write(dir.path(), "agents/bad/system_prompt.mdc", "---\nidentity:\n  name: bad\n---\n");

        let report = lint_catalog(dir.path());
        assert_eq!(report.agents.len(), 2);
        assert_eq!(report.valid_count(), 1);
        assert!(report.has_errors());
    }
}
