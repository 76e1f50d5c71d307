//! Catalog loader: reads every definition file under the catalog root.
//!
//! Layout:
//! ```text
//! agents/<agent_id>/system_prompt.mdc
//! skills/<skill_id>.mdc
//! implants/<implant_id>.mdc
//! ```
//! Malformed files are reported and skipped; loading always continues.

use skillroute_core::error::CatalogError;
use skillroute_core::{CatalogEntry, Collection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::frontmatter::{FragmentKind, parse_agent, parse_fragment};
use crate::imports::expand_imports;

/// File name of an agent's definition inside its directory.
pub const AGENT_PROMPT_FILE: &str = "system_prompt.mdc";

/// Directories under `agents/` that never define an agent.
const SHARED_AGENT_DIRS: &[&str] = &["common"];

/// Everything one load pass produced.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub entries: Vec<CatalogEntry>,
    /// Files that were skipped, with the reason
    pub rejected: Vec<CatalogError>,
}

impl LoadReport {
    pub fn count(&self, collection: Collection) -> usize {
        self.entries.iter().filter(|e| e.collection() == collection).count()
    }
}

/// Agent directories that contain a prompt file, sorted by id.
pub fn agent_dirs(root: &Path) -> Vec<(String, PathBuf)> {
    let mut dirs = Vec::new();
    let Ok(read) = std::fs::read_dir(root.join("agents")) else {
        return dirs;
    };

    for entry in read.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        if !path.is_dir() || name.starts_with('.') || SHARED_AGENT_DIRS.contains(&name.as_str()) {
            continue;
        }
        let prompt = path.join(AGENT_PROMPT_FILE);
        if prompt.is_file() {
            dirs.push((name, prompt));
        }
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    dirs
}

/// `.mdc` files directly inside `dir`, sorted by id (file stem).
pub fn fragment_files(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut files: Vec<(String, PathBuf)> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "mdc"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            Some((stem, path))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

fn read(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load a single agent, expanding its imports.
pub fn load_agent(root: &Path, id: &str, path: &Path) -> Result<CatalogEntry, CatalogError> {
    let content = read(path)?;
    let mut entry = parse_agent(id, &content, path)?;
    entry.text = expand_imports(root, path, &entry.text);
    Ok(entry)
}

/// Load all agents, skills, and implants under `root`.
pub fn load_all(root: &Path) -> LoadReport {
    let mut report = LoadReport::default();

    if !root.is_dir() {
        warn!(root = %root.display(), "Catalog root does not exist");
        return report;
    }

    for (id, path) in agent_dirs(root) {
        push(&mut report, load_agent(root, &id, &path));
    }

    for (dir, kind) in [("skills", FragmentKind::Skill), ("implants", FragmentKind::Implant)] {
        for (id, path) in fragment_files(&root.join(dir)) {
            let parsed = read(&path).and_then(|content| parse_fragment(kind, &id, &content, &path));
            push(&mut report, parsed);
        }
    }

    info!(
        agents = report.count(Collection::Agents),
        skills = report.count(Collection::Skills),
        implants = report.count(Collection::Implants),
        rejected = report.rejected.len(),
        "Catalog loaded"
    );
    report
}

fn push(report: &mut LoadReport, result: Result<CatalogEntry, CatalogError>) {
    match result {
        Ok(entry) => {
            debug!(id = %entry.id, collection = %entry.collection(), "Loaded catalog entry");
            report.entries.push(entry);
        }
        Err(e) => {
            warn!(error = %e, "Skipping catalog entry");
            report.rejected.push(e);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    pub fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn agent(root: &Path, id: &str, keywords: &str, extra: &str, body: &str) {
        write(
            root,
            &format!("agents/{id}/system_prompt.mdc"),
            &format!(
                "---\nidentity:\n  name: {id}\nrouting:\n  domain_keywords: [{keywords}]\n{extra}---\n{body}\n"
            ),
        );
    }

    pub fn fragment(root: &Path, dir: &str, id: &str, description: &str, body: &str) {
        write(
            root,
            &format!("{dir}/{id}.mdc"),
            &format!("---\ndescription: {description}\n---\n{body}\n"),
        );
    }
}
