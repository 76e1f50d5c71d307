//! `skillroute agents`: List catalog agents.

use skillroute_catalog::load_all;
use skillroute_config::AppConfig;
use skillroute_core::CatalogEntry;

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let report = load_all(&config.catalog.root);
    let rows = rows(&report.entries);

    if rows.is_empty() {
        println!("No agents found under {}", config.catalog.root.join("agents").display());
        return Ok(());
    }

    println!("{:<24} {:<10} {:<28} Keywords", "Agent", "Trigger", "Name");
    println!("{}", "-".repeat(80));
    for row in &rows {
        println!("{row}");
    }
    println!("\n{} agents", rows.len());
    if !report.rejected.is_empty() {
        println!("⚠️  {} definition files skipped (run `skillroute validate`)", report.rejected.len());
    }

    Ok(())
}

fn rows(entries: &[CatalogEntry]) -> Vec<String> {
    let mut rows: Vec<(&str, String)> = entries
        .iter()
        .filter_map(|entry| {
            let profile = entry.as_agent()?;
            let row = format!(
                "{:<24} {:<10} {:<28} {}",
                entry.id,
                profile.trigger_command.as_deref().unwrap_or("-"),
                profile.display_name,
                profile.domain_keywords.join(", ")
            );
            Some((entry.id.as_str(), row))
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    rows.into_iter().map(|(_, row)| row).collect()
}
