//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Structured requests
//! set `format: "json"` and still go through the tolerant JSON extractor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::parsing::extract_json;
use super::NarrativeBackend;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: build_client(DEFAULT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// Create a new instance with a different request timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            http_client: build_client(timeout),
            timeout,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn generate(&self, prompt: &str, format: Option<&'static str>) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let response = response.error_for_status()?;
        let ollama_response: OllamaResponse = response.json().await?;
        debug!(model = %self.model, "Ollama response: {}", ollama_response.response);

        if ollama_response.response.trim().is_empty() {
            return Err(Error::Ai("Empty response from Ollama".into()));
        }
        Ok(ollama_response.response)
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl NarrativeBackend for OllamaBackend {
    async fn is_available(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, None).await
    }

    async fn generate_json_value(&self, prompt: &str) -> Result<Option<serde_json::Value>> {
        let raw = self.generate(prompt, Some("json")).await?;
        extract_json(&raw)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = OllamaRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            format: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("format").is_none());

        let request = OllamaRequest {
            format: Some("json"),
            ..request
        };
        assert_eq!(serde_json::to_value(&request).unwrap()["format"], "json");
    }

    #[test]
    fn test_with_timeout_keeps_model() {
        let backend = OllamaBackend::new("http://localhost:11434", "gemma3")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(backend.model(), "gemma3");
        assert_eq!(backend.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let backend = OllamaBackend::new("http://127.0.0.1:9", "gemma3")
            .with_timeout(Duration::from_millis(500));
        assert!(!backend.is_available().await);
        assert!(backend.generate_text("hello").await.is_err());
    }
}
