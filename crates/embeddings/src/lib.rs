//! Embedding providers for skillroute.
//!
//! All providers implement the `skillroute_core::Embedder` trait.
//! `build_from_config` selects one based on configuration.

pub mod hashing;
pub mod openai_compat;

pub use hashing::HashingEmbedder;
pub use openai_compat::OpenAiCompatEmbedder;

use skillroute_config::EmbeddingConfig;
use skillroute_core::error::EmbeddingError;
use skillroute_core::Embedder;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured embedder.
///
/// `"hashing"` needs nothing; any other provider name is treated as an
/// OpenAI-compatible endpoint at `api_url` and requires an API key, except
/// `"ollama"` which runs locally without one.
pub fn build_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
        provider => {
            let api_key = match (&config.api_key, provider) {
                (Some(key), _) => key.clone(),
                (None, "ollama") => "ollama".to_string(),
                (None, _) => {
                    return Err(EmbeddingError::NotConfigured(format!(
                        "embedding provider '{provider}' requires an API key"
                    )));
                }
            };
            tracing::info!(provider, model = %config.model, "Using remote embeddings");
            Ok(Arc::new(OpenAiCompatEmbedder::new(
                provider,
                config.api_url.clone(),
                api_key,
                config.model.clone(),
                0,
                Duration::from_millis(config.timeout_ms),
            )))
        }
    }
}
