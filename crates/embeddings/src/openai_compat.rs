//! OpenAI-compatible embedding provider.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any
//! endpoint exposing `POST /embeddings`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillroute_core::error::EmbeddingError;
use skillroute_core::Embedder;
use std::time::Duration;
use tracing::{debug, warn};

/// An embedder backed by an OpenAI-compatible HTTP API.
pub struct OpenAiCompatEmbedder {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatEmbedder {
    /// Create a new OpenAI-compatible embedder.
    ///
    /// `dimensions` is the expected vector width (0 = accept any); responses
    /// of another width are rejected.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            timeout,
            client,
        }
    }

    /// Create an OpenAI embedder (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self::new(
            "openai",
            "https://api.openai.com/v1",
            api_key,
            model,
            dimensions,
            Duration::from_secs(30),
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

/// Map a non-200 status to an error.
fn status_error(status: u16, body: String) -> EmbeddingError {
    match status {
        429 => EmbeddingError::RateLimited { retry_after_secs: 5 },
        401 | 403 => EmbeddingError::AuthenticationFailed("Invalid API key or insufficient permissions".into()),
        _ => EmbeddingError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

fn first_embedding(response: EmbeddingApiResponse, expected: usize) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| EmbeddingError::ApiError {
            status_code: 200,
            message: "No embeddings in response".into(),
        })?;

    if expected > 0 && embedding.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

#[async_trait]
impl Embedder for OpenAiCompatEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        debug!(provider = %self.name, model = %self.model, chars = text.len(), "Sending embedding request");

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    EmbeddingError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, provider = %self.name, "Embedding provider returned error");
            return Err(status_error(status, error_body));
        }

        let api_resp: EmbeddingApiResponse = response.json().await.map_err(|e| EmbeddingError::ApiError {
            status_code: 200,
            message: format!("Failed to parse embedding response: {e}"),
        })?;

        first_embedding(api_resp, self.dimensions)
    }
}

// --- Embedding API types ---

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    #[allow(dead_code)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let e = OpenAiCompatEmbedder::new(
            "ollama",
            "http://localhost:11434/v1/",
            "ollama",
            "nomic-embed-text",
            768,
            Duration::from_secs(5),
        );
        assert_eq!(e.endpoint(), "http://localhost:11434/v1/embeddings");
        assert_eq!(e.name(), "ollama");
        assert_eq!(e.dimensions(), 768);
    }

    #[test]
    fn parse_embedding_response() {
        let json = r#"{
            "data": [
                {"embedding": [0.1, 0.2, 0.3], "index": 0}
            ],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 5, "total_tokens": 5}
        }"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_embedding(parsed, 3).unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn wrong_width_is_rejected() {
        let parsed: EmbeddingApiResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [0.1, 0.2]}]}"#).unwrap();
        let err = first_embedding(parsed, 3).unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn empty_data_is_api_error() {
        let parsed: EmbeddingApiResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(matches!(first_embedding(parsed, 0), Err(EmbeddingError::ApiError { .. })));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_error(429, String::new()), EmbeddingError::RateLimited { .. }));
        assert!(matches!(status_error(401, String::new()), EmbeddingError::AuthenticationFailed(_)));
        assert!(matches!(status_error(403, String::new()), EmbeddingError::AuthenticationFailed(_)));
        assert!(matches!(
            status_error(500, "boom".into()),
            EmbeddingError::ApiError { status_code: 500, .. }
        ));
    }

    /// Answer a single HTTP request with a canned response; returns the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request);
                if text.contains("\r\n\r\n") && text.ends_with('}') {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{addr}/v1")
    }

    fn embedder(base_url: String) -> OpenAiCompatEmbedder {
        OpenAiCompatEmbedder::new("local", base_url, "key", "test-model", 3, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn error_status_is_returned_without_parsing_body() {
        let base = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let err = embedder(base).embed("hello").await.unwrap_err();
        match err {
            EmbeddingError::ApiError { status_code, message } => {
                assert_eq!(status_code, 500);
                assert!(message.contains("boom"));
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_status_maps_to_rate_limited() {
        let base = serve_once("429 Too Many Requests", "{}").await;
        let err = embedder(base).embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn success_status_parses_embedding() {
        let base = serve_once("200 OK", r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#).await;
        let vector = embedder(base).embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn request_serializes_float_format() {
        let body = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: "hello",
            encoding_format: "float",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["encoding_format"], "float");
        assert_eq!(json["input"], "hello");
    }
}
