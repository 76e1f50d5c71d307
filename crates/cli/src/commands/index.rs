//! `skillroute index`: Rebuild the persisted catalog index.

use skillroute_catalog::IndexMode;
use skillroute_config::AppConfig;

use super::build_runtime;

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧭 Indexing catalog at {}", config.catalog.root.display());

    let runtime = build_runtime(config, IndexMode::Rebuild).await?;
    let summary = &runtime.summary;

    println!("   ✅ Agents:    {}", summary.agents);
    println!("   ✅ Skills:    {}", summary.skills);
    println!("   ✅ Implants:  {}", summary.implants);
    if summary.failed > 0 {
        println!("   ⚠️  {} entries could not be embedded", summary.failed);
    }
    if runtime.rejected > 0 {
        println!("   ⚠️  {} definition files skipped (run `skillroute validate`)", runtime.rejected);
    }
    println!("   Index written to {}", config.catalog.index_path.display());

    Ok(())
}
