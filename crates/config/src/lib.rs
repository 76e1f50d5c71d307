//! Configuration loading, validation, and management for skillroute.
//!
//! Loads configuration from `~/.skillroute/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.skillroute/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog source and persisted index
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Meta classifier, selector, and route cache
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Skill/implant retrieval
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Language directive injection
    #[serde(default)]
    pub language: LanguageConfig,

    /// Session prompt cache
    #[serde(default)]
    pub session: SessionConfig,

    /// HTTP tool surface
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Route recorder
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding `agents/`, `skills/`, and `implants/`
    #[serde(default = "default_catalog_root")]
    pub root: PathBuf,

    /// JSON-lines vector index
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

fn default_catalog_root() -> PathBuf {
    AppConfig::config_dir().join("catalog")
}
fn default_index_path() -> PathBuf {
    AppConfig::config_dir().join("index.jsonl")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: default_catalog_root(),
            index_path: default_index_path(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hashing" (local, default), "openai", or any OpenAI-compatible name
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Vector width of the hashing embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_embedding_provider() -> String {
    "hashing".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_dimensions() -> usize {
    384
}
fn default_timeout_ms() -> u64 {
    2000
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_url: default_embedding_api_url(),
            api_key: None,
            dimensions: default_dimensions(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("dimensions", &self.dimensions)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Agent used for meta queries and as the abstention fallback
    #[serde(default = "default_agent")]
    pub default_agent: String,

    /// Queries shorter than this (trimmed, in chars) are meta
    #[serde(default = "default_meta_min_chars")]
    pub meta_min_chars: usize,

    /// Blended score the top agent must reach to resolve without the host
    #[serde(default = "default_selector_confidence")]
    pub selector_confidence: f32,

    /// Trailing history characters folded into the route cache key
    #[serde(default = "default_history_chars")]
    pub history_chars: usize,

    #[serde(default = "default_route_cache_capacity")]
    pub route_cache_capacity: usize,
}

fn default_agent() -> String {
    "universal_agent".into()
}
fn default_meta_min_chars() -> usize {
    10
}
fn default_selector_confidence() -> f32 {
    0.55
}
fn default_history_chars() -> usize {
    200
}
fn default_route_cache_capacity() -> usize {
    1024
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_agent: default_agent(),
            meta_min_chars: default_meta_min_chars(),
            selector_confidence: default_selector_confidence(),
            history_chars: default_history_chars(),
            route_cache_capacity: default_route_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_skills_k")]
    pub skills_k: usize,

    #[serde(default = "default_implants_k")]
    pub implants_k: usize,

    /// Skills below this cosine similarity are never returned
    #[serde(default = "default_skill_min_similarity")]
    pub skill_min_similarity: f32,

    /// Implants below this cosine similarity are never returned
    #[serde(default = "default_implant_min_similarity")]
    pub implant_min_similarity: f32,

    /// Additive bonus for ids on the agent's preference list
    #[serde(default = "default_preference_bonus")]
    pub preference_bonus: f32,

    #[serde(default = "default_timeout_ms")]
    pub store_timeout_ms: u64,
}

fn default_skills_k() -> usize {
    4
}
fn default_implants_k() -> usize {
    3
}
fn default_skill_min_similarity() -> f32 {
    0.55
}
fn default_implant_min_similarity() -> f32 {
    0.27
}
fn default_preference_bonus() -> f32 {
    0.1
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            skills_k: default_skills_k(),
            implants_k: default_implants_k(),
            skill_min_similarity: default_skill_min_similarity(),
            implant_min_similarity: default_implant_min_similarity(),
            preference_bonus: default_preference_bonus(),
            store_timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// ISO 639-3 code that needs no directive
    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default = "default_language_confidence")]
    pub min_confidence: f64,
}

fn default_language() -> String {
    "eng".into()
}
fn default_language_confidence() -> f64 {
    0.5
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            min_confidence: default_language_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_capacity")]
    pub capacity: usize,
}

fn default_session_capacity() -> usize {
    512
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: default_session_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42618
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Route records kept in memory
    #[serde(default = "default_history")]
    pub history: usize,
}

fn default_history() -> usize {
    256
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            history: default_history(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.skillroute/config.toml).
    ///
    /// Environment overrides:
    /// - `SKILLROUTE_CATALOG_DIR`
    /// - `SKILLROUTE_EMBEDDING_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `SKILLROUTE_EMBEDDING_PROVIDER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("SKILLROUTE_CATALOG_DIR") {
            self.catalog.root = PathBuf::from(dir);
        }

        if self.embedding.api_key.is_none() {
            self.embedding.api_key =
                lookup("SKILLROUTE_EMBEDDING_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("SKILLROUTE_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".skillroute")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("routing.selector_confidence", self.routing.selector_confidence),
            ("retrieval.skill_min_similarity", self.retrieval.skill_min_similarity),
            ("retrieval.implant_min_similarity", self.retrieval.implant_min_similarity),
            ("retrieval.preference_bonus", self.retrieval.preference_bonus),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.language.min_confidence) {
            return Err(ConfigError::ValidationError(
                "language.min_confidence must be between 0.0 and 1.0".into(),
            ));
        }

        let counts = [
            ("retrieval.skills_k", self.retrieval.skills_k),
            ("retrieval.implants_k", self.retrieval.implants_k),
            ("routing.route_cache_capacity", self.routing.route_cache_capacity),
            ("session.capacity", self.session.capacity),
            ("embedding.dimensions", self.embedding.dimensions),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!("{name} must be >= 1")));
            }
        }

        if whatlang::Lang::from_code(&self.language.default_language).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "language.default_language '{}' is not a known ISO 639-3 code",
                self.language.default_language
            )));
        }

        if self.routing.default_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "routing.default_agent must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Whether the configured embedder talks to a remote API.
    pub fn uses_remote_embeddings(&self) -> bool {
        self.embedding.provider != "hashing"
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
