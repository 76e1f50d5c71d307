//! `skillroute status`: Show configuration, catalog, and index summary.

use std::path::Path;

use skillroute_catalog::{FileVectorStore, load_all};
use skillroute_config::AppConfig;
use skillroute_core::{Collection, VectorStore};

pub async fn run(config: &AppConfig, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    println!("🧭 skillroute Status");
    println!("===================");
    println!("  Config:       {}", config_path.display());
    println!("  Catalog:      {}", config.catalog.root.display());
    println!("  Index:        {}", config.catalog.index_path.display());
    println!("  Embedder:     {} ({})", config.embedding.provider, config.embedding.model);
    println!("  Default:      {}", config.routing.default_agent);
    println!("  Confidence:   {}", config.routing.selector_confidence);
    println!("  Language:     {}", config.language.default_language);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Telemetry:    {}", if config.telemetry.enabled { "enabled" } else { "disabled" });

    let report = load_all(&config.catalog.root);
    println!();
    for collection in Collection::ALL {
        println!("  {:<13} {} loaded", format!("{collection}:"), report.count(collection));
    }
    if !report.rejected.is_empty() {
        println!("  ⚠️  {} definition files skipped", report.rejected.len());
    }

    if config.catalog.index_path.exists() {
        let store = FileVectorStore::open(&config.catalog.index_path);
        let mut indexed = Vec::new();
        for collection in Collection::ALL {
            indexed.push(format!("{collection}={}", store.count(collection).await?));
        }
        println!("\n  ✅ Index found ({})", indexed.join(", "));
    } else {
        println!("\n  ⚠️  No index — run `skillroute index` first");
    }

    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults");
    }

    Ok(())
}
