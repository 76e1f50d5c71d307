//! `skillroute validate`: Lint catalog definition files.

use skillroute_catalog::{LintReport, lint_catalog};
use skillroute_config::AppConfig;

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating catalog at {}", config.catalog.root.display());

    let report = lint_catalog(&config.catalog.root);
    print_report(&report);

    if report.has_errors() {
        return Err(format!(
            "{} of {} agents failed validation",
            report.agents.len() - report.valid_count(),
            report.agents.len()
        )
        .into());
    }
    Ok(())
}

fn print_report(report: &LintReport) {
    if report.agents.is_empty() {
        println!("   ⚠️  No agents found");
        return;
    }

    for agent in &report.agents {
        if agent.is_valid() && agent.warnings.is_empty() {
            println!("   ✅ {}", agent.agent_id);
            continue;
        }
        let mark = if agent.is_valid() { "⚠️ " } else { "❌" };
        println!("   {mark} {}", agent.agent_id);
        for error in &agent.errors {
            println!("        error: {error}");
        }
        for warning in &agent.warnings {
            println!("        warning: {warning}");
        }
    }

    println!();
    println!("   {}/{} agents valid", report.valid_count(), report.agents.len());
}
