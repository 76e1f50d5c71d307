//! `skillroute serve`: Start the HTTP tool surface.

use std::sync::Arc;

use skillroute_catalog::IndexMode;
use skillroute_config::AppConfig;
use skillroute_gateway::GatewayState;

use super::build_runtime;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let runtime = build_runtime(&config, IndexMode::IfEmpty).await?;
    let stats = runtime.engine.stats();

    println!("🧭 skillroute gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Catalog:    {} agents, {} skills, {} implants", stats.agents, stats.skills, stats.implants);
    println!("   Embedder:   {}", stats.embedder);
    println!("   Telemetry:  {}", if runtime.recorder.is_some() { "enabled" } else { "disabled" });

    let mut state = GatewayState::new(runtime.engine);
    if let Some(recorder) = runtime.recorder {
        state = state.with_recorder(recorder);
    }
    skillroute_gateway::start(&config.gateway, Arc::new(state)).await?;

    Ok(())
}
