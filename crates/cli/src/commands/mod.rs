//! Subcommands and the runtime they share.

pub mod agents;
pub mod context;
pub mod index;
pub mod route;
pub mod serve;
pub mod status;
pub mod validate;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use skillroute_catalog::{Catalog, FileVectorStore, IndexMode, IndexSummary, index_entries, load_all};
use skillroute_config::AppConfig;
use skillroute_core::{Collection, VectorStore};
use skillroute_router::RoutingEngine;
use skillroute_telemetry::RouteRecorder;
use tracing::info;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into());
    };
    let mut config = AppConfig::load_from(path).map_err(|e| format!("Failed to load config: {e}"))?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// A loaded, indexed engine plus what it took to build it.
pub struct Runtime {
    pub engine: Arc<RoutingEngine>,
    pub recorder: Option<Arc<RouteRecorder>>,
    pub summary: IndexSummary,
    pub rejected: usize,
}

/// Load the catalog, index it per `mode`, and wire up the routing engine.
pub async fn build_runtime(config: &AppConfig, mode: IndexMode) -> Result<Runtime, Box<dyn std::error::Error>> {
    let root = &config.catalog.root;
    let mut report = load_all(root);
    if report.count(Collection::Agents) == 0 {
        return Err(format!("No agents found under {}", root.join("agents").display()).into());
    }

    let embedder = skillroute_embeddings::build_from_config(&config.embedding)?;
    let store: Arc<dyn VectorStore> = Arc::new(FileVectorStore::open(&config.catalog.index_path));
    let summary = index_entries(&mut report.entries, embedder.as_ref(), store.as_ref(), mode).await?;

    let catalog = Arc::new(Catalog::new(
        report.entries,
        store,
        Duration::from_millis(config.retrieval.store_timeout_ms),
    ));

    let mut engine = RoutingEngine::new(catalog, embedder, config);
    let recorder = config
        .telemetry
        .enabled
        .then(|| Arc::new(RouteRecorder::from_config(&config.telemetry)));
    if let Some(recorder) = &recorder {
        engine = engine.with_observer(recorder.clone());
    }

    info!(
        agents = summary.agents,
        rejected = report.rejected.len(),
        index = %config.catalog.index_path.display(),
        "Runtime ready"
    );

    Ok(Runtime {
        engine: Arc::new(engine),
        recorder,
        summary,
        rejected: report.rejected.len(),
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use skillroute_core::RouteSource;
    use skillroute_router::RouteRequest;

    #[tokio::test]
    async fn runtime_indexes_and_routes() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::catalog(dir.path());

        let runtime = build_runtime(&config, IndexMode::Rebuild).await.unwrap();
        assert_eq!(runtime.summary.agents, 2);
        assert_eq!(runtime.summary.skills, 1);
        assert_eq!(runtime.summary.implants, 1);
        assert_eq!(runtime.rejected, 0);
        assert!(config.catalog.index_path.exists());

        let outcome = runtime.engine.route(&RouteRequest::new("/dev why does this segfault")).await;
        let resolution = outcome.resolution().unwrap();
        assert_eq!(resolution.agent_id, "software_engineer");
        assert_eq!(resolution.source, RouteSource::Trigger);
        assert!(resolution.composite_prompt.starts_with("You are a senior software engineer."));

        let stats = runtime.recorder.unwrap().stats();
        assert_eq!(stats.requests, 1);
    }

    #[tokio::test]
    async fn if_empty_reuses_persisted_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::catalog(dir.path());

        build_runtime(&config, IndexMode::Rebuild).await.unwrap();
        let runtime = build_runtime(&config, IndexMode::IfEmpty).await.unwrap();

        assert_eq!(runtime.summary.skills, 0);
        assert_eq!(runtime.summary.reused, vec![Collection::Skills, Collection::Implants]);
        assert_eq!(runtime.summary.agents, 2);
    }

    #[tokio::test]
    async fn empty_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.catalog.root = dir.path().to_path_buf();
        config.catalog.index_path = dir.path().join("index.jsonl");

        let err = build_runtime(&config, IndexMode::IfEmpty).await.err().unwrap();
        assert!(err.to_string().contains("No agents found"));
    }

    #[tokio::test]
    async fn telemetry_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::catalog(dir.path());
        config.telemetry.enabled = false;

        let runtime = build_runtime(&config, IndexMode::Rebuild).await.unwrap();
        assert!(runtime.recorder.is_none());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[routing]\ndefault_agent = \"generalist\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.routing.default_agent, "generalist");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[routing]\nselector_confidence = 3.0\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }
}
