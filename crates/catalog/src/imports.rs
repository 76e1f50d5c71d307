//! `@path/to/file.mdc` import expansion, sandboxed to the catalog root.
//!
//! References are resolved lexically first (so `..` can never climb out of
//! the root), then canonicalized to catch symlinks pointing elsewhere.
//! Failures never abort loading; they leave a visible marker in the text.

use regex_lite::{Captures, Regex};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

use crate::frontmatter::strip_frontmatter;

static IMPORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[\w./-]+\.mdc").expect("import pattern is valid"));

/// Why a reference could not be inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportFailure {
    /// Resolves outside the catalog root
    Blocked,
    /// Already being expanded higher up the chain
    Circular,
    /// Target does not exist or cannot be read
    Missing,
}

impl ImportFailure {
    pub fn marker(&self, reference: &str) -> String {
        match self {
            Self::Blocked => format!("[BLOCKED IMPORT: {reference}]"),
            Self::Circular => format!("[CIRCULAR IMPORT: {reference}]"),
            Self::Missing => format!("[MISSING IMPORT: {reference}]"),
        }
    }
}

/// Resolve an `@` reference to a path inside `root`.
///
/// `@.cursor/x.mdc` and `@x.mdc` both resolve to `<root>/x.mdc`.
pub fn resolve_reference(root: &Path, reference: &str) -> Result<PathBuf, ImportFailure> {
    let relative = reference.trim_start_matches('@');
    let relative = relative.strip_prefix(".cursor/").unwrap_or(relative);

    let mut resolved = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(ImportFailure::Blocked);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(ImportFailure::Blocked),
        }
    }

    let candidate = root.join(resolved);

    // Symlinks may still lead outside the root.
    if let (Ok(canonical), Ok(canonical_root)) = (candidate.canonicalize(), root.canonicalize())
        && !canonical.starts_with(&canonical_root)
    {
        return Err(ImportFailure::Blocked);
    }

    Ok(candidate)
}

/// Expand every import in `content`. `origin` is the file the content came
/// from and counts as already seen.
pub fn expand_imports(root: &Path, origin: &Path, content: &str) -> String {
    let mut seen = HashSet::new();
    seen.insert(canonical_or_raw(origin));
    expand_with(root, content, &seen)
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn expand_with(root: &Path, content: &str, seen: &HashSet<PathBuf>) -> String {
    IMPORT_PATTERN
        .replace_all(content, |caps: &Captures<'_>| {
            let reference = &caps[0];
            match inline(root, reference, seen) {
                Ok(text) => text,
                Err(failure) => {
                    warn!(reference, ?failure, "Import not expanded");
                    failure.marker(reference)
                }
            }
        })
        .into_owned()
}

fn inline(root: &Path, reference: &str, seen: &HashSet<PathBuf>) -> Result<String, ImportFailure> {
    let path = resolve_reference(root, reference)?;
    let key = canonical_or_raw(&path);
    if seen.contains(&key) {
        return Err(ImportFailure::Circular);
    }

    let raw = std::fs::read_to_string(&path).map_err(|_| ImportFailure::Missing)?;

    // Each branch tracks its own chain; siblings may import the same file.
    let mut branch = seen.clone();
    branch.insert(key);
    Ok(expand_with(root, strip_frontmatter(&raw), &branch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn catalog() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("agents/common")).unwrap();
        fs::create_dir_all(dir.path().join("implants")).unwrap();
        dir
    }

    #[test]
    fn inlines_import_and_strips_frontmatter() {
        let dir = catalog();
        fs::write(
            dir.path().join("agents/common/core-protocol.mdc"),
            "---\ndescription: core\n---\nAlways be precise.",
        )
        .unwrap();

        let out = expand_imports(
            dir.path(),
            &dir.path().join("agents/x/system_prompt.mdc"),
            "Apply Core Protocol: @agents/common/core-protocol.mdc",
        );
        assert_eq!(out, "Apply Core Protocol: Always be precise.");
    }

    #[test]
    fn nested_imports_expand_recursively() {
        let dir = catalog();
        fs::write(dir.path().join("agents/common/a.mdc"), "A then @agents/common/b.mdc").unwrap();
        fs::write(dir.path().join("agents/common/b.mdc"), "B").unwrap();

        let out = expand_imports(dir.path(), Path::new("origin.mdc"), "@agents/common/a.mdc");
        assert_eq!(out, "A then B");
    }

    #[test]
    fn cursor_prefix_maps_to_root() {
        let dir = catalog();
        fs::write(dir.path().join("implants/implant-reflexion.mdc"), "Reflect.").unwrap();

        let out = expand_imports(dir.path(), Path::new("o.mdc"), "- @.cursor/implants/implant-reflexion.mdc");
        assert_eq!(out, "- Reflect.");
    }

    #[test]
    fn traversal_is_blocked() {
        let dir = catalog();
        let out = expand_imports(dir.path(), Path::new("o.mdc"), "@../../etc/secrets.mdc");
        assert_eq!(out, "[BLOCKED IMPORT: @../../etc/secrets.mdc]");
    }

    #[test]
    fn cycles_are_marked() {
        let dir = catalog();
        fs::write(dir.path().join("agents/common/a.mdc"), "A @agents/common/b.mdc").unwrap();
        fs::write(dir.path().join("agents/common/b.mdc"), "B @agents/common/a.mdc").unwrap();

        let out = expand_imports(dir.path(), Path::new("o.mdc"), "@agents/common/a.mdc");
        assert_eq!(out, "A B [CIRCULAR IMPORT: @agents/common/a.mdc]");
    }

    #[test]
    fn missing_files_are_marked() {
        let dir = catalog();
        let out = expand_imports(dir.path(), Path::new("o.mdc"), "see @agents/common/nope.mdc");
        assert_eq!(out, "see [MISSING IMPORT: @agents/common/nope.mdc]");
    }

    #[test]
    fn sibling_imports_of_same_file_both_expand() {
        let dir = catalog();
        fs::write(dir.path().join("agents/common/a.mdc"), "A").unwrap();
        let out = expand_imports(dir.path(), Path::new("o.mdc"), "@agents/common/a.mdc @agents/common/a.mdc");
        assert_eq!(out, "A A");
    }

    #[test]
    fn parent_dir_inside_root_is_allowed() {
        let dir = catalog();
        let path = resolve_reference(dir.path(), "@agents/common/../x.mdc").unwrap();
        assert_eq!(path, dir.path().join("agents/x.mdc"));
    }
}
