//! `skillroute context`: Accept a host-chosen agent and print the enriched prompt.

use skillroute_catalog::IndexMode;
use skillroute_config::AppConfig;

use super::build_runtime;

pub async fn run(
    config: &AppConfig,
    agent: &str,
    query: &str,
    history: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime(config, IndexMode::IfEmpty).await?;
    let resolution = runtime.engine.accept_host_choice(agent, query, history).await?;

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}
