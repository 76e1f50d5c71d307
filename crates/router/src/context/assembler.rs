//! Enrichment assembler: builds the composite prompt.
//!
//! Section order is fixed:
//!
//! 1. **Base** agent prompt
//! 2. **Skills**, in retrieval order
//! 3. **Implants**, in retrieval order
//! 4. **Language directive**, always last
//!
//! Empty sections are omitted; the rest are joined by a blank line. The
//! output depends only on the inputs.

use skillroute_core::CatalogEntry;

// ── Section headings ──────────────────────────────────────────────────────

pub const SKILLS_HEADING: &str = "## Dynamic Skills (Contextually Loaded)";
pub const IMPLANTS_HEADING: &str = "## Dynamic Implants (Contextually Loaded)";

const SKILLS_LEAD: &str = "The following specialized skills have been loaded to help with the request:";
const IMPLANTS_LEAD: &str = "The following cognitive implants have been loaded to augment reasoning:";

// ── Formatting ────────────────────────────────────────────────────────────

fn format_section(heading: &str, lead: &str, label: &str, entries: &[CatalogEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = format!("{heading}\n{lead}\n");
    for entry in entries {
        out.push_str(&format!(
            "\n### {label}: {}\n**Description**: {}\n{}\n",
            entry.id,
            entry.description(),
            entry.text.trim()
        ));
    }
    out.trim_end().to_string()
}

/// The skills section, or an empty string for no skills.
pub fn format_skills(skills: &[CatalogEntry]) -> String {
    format_section(SKILLS_HEADING, SKILLS_LEAD, "Skill", skills)
}

/// The implants section, or an empty string for no implants.
pub fn format_implants(implants: &[CatalogEntry]) -> String {
    format_section(IMPLANTS_HEADING, IMPLANTS_LEAD, "Implant", implants)
}

/// Join non-empty sections with a blank line.
pub fn join_sections<'a>(sections: impl IntoIterator<Item = &'a str>) -> String {
    sections
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Base prompt, then skills, then implants, then the directive.
pub fn assemble(
    base_prompt: &str,
    skills: &[CatalogEntry],
    implants: &[CatalogEntry],
    language_directive: Option<&str>,
) -> String {
    let skills = format_skills(skills);
    let implants = format_implants(implants);
    join_sections([base_prompt, skills.as_str(), implants.as_str(), language_directive.unwrap_or("")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::fragment_entry;
    use skillroute_core::Collection;

    fn skills() -> Vec<CatalogEntry> {
        vec![
            fragment_entry(Collection::Skills, "skill-debugging", "Systematic debugging"),
            fragment_entry(Collection::Skills, "skill-rust", "Rust idioms"),
        ]
    }

    fn implants() -> Vec<CatalogEntry> {
        vec![fragment_entry(Collection::Implants, "implant-reflexion", "Self-critique loop")]
    }

    const DIRECTIVE: &str = "## Language Directive\nThe user wrote in Russian.";

    #[test]
    fn sections_appear_in_fixed_order() {
        let prompt = assemble("You are a software engineer.", &skills(), &implants(), Some(DIRECTIVE));

        let base = prompt.find("You are a software engineer.").unwrap();
        let skills_at = prompt.find(SKILLS_HEADING).unwrap();
        let debugging = prompt.find("### Skill: skill-debugging").unwrap();
        let rust = prompt.find("### Skill: skill-rust").unwrap();
        let implants_at = prompt.find(IMPLANTS_HEADING).unwrap();
        let directive = prompt.find("## Language Directive").unwrap();

        assert!(base < skills_at && skills_at < debugging && debugging < rust);
        assert!(rust < implants_at && implants_at < directive);
        assert!(prompt.ends_with("The user wrote in Russian."));
    }

    #[test]
    fn directive_is_last_even_without_fragments() {
        let prompt = assemble("Base.", &[], &[], Some(DIRECTIVE));
        assert_eq!(prompt, format!("Base.\n\n{DIRECTIVE}"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        assert_eq!(assemble("Base.", &[], &[], None), "Base.");
        assert_eq!(assemble("", &[], &[], None), "");
        assert!(!assemble("Base.", &skills(), &[], None).contains(IMPLANTS_HEADING));
    }

    #[test]
    fn fragment_formatting() {
        let section = format_implants(&implants());
        assert_eq!(
            section,
            "## Dynamic Implants (Contextually Loaded)\n\
             The following cognitive implants have been loaded to augment reasoning:\n\
             \n\
             ### Implant: implant-reflexion\n\
             **Description**: Self-critique loop\n\
             Body of implant-reflexion."
        );
        assert_eq!(format_skills(&[]), "");
    }

    #[test]
    fn assembly_is_deterministic() {
        let a = assemble("Base.", &skills(), &implants(), Some(DIRECTIVE));
        let b = assemble("Base.", &skills(), &implants(), Some(DIRECTIVE));
        assert_eq!(a, b);
    }
}
