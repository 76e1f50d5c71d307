//! `skillroute route`: Route a query and print the outcome as JSON.

use skillroute_catalog::IndexMode;
use skillroute_config::AppConfig;
use skillroute_router::RouteRequest;

use super::build_runtime;

pub async fn run(config: &AppConfig, query: String, history: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime(config, IndexMode::IfEmpty).await?;
    let outcome = runtime
        .engine
        .route(&RouteRequest::new(query).with_history(history))
        .await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
