//! Pluggable narrative-generation backend
//!
//! The analysis engine never depends on a provider directly. Reports are
//! fully valid without AI; a backend only enriches narrative fields
//! (action-plan steps, budget suggestion).
//!
//! # Architecture
//!
//! - `NarrativeBackend` trait: availability check plus text and JSON generation
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod mock;
mod ollama;
pub mod parsing;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Capability interface for generative text/JSON providers
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Check if the backend is reachable
    async fn is_available(&self) -> bool;

    /// Free-form text completion
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Completion expected to contain a JSON object; `None` if no JSON came back
    async fn generate_json_value(&self, prompt: &str) -> Result<Option<serde_json::Value>>;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Same backend with a different request timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_timeout(timeout)),
            AIClient::Mock(b) => AIClient::Mock(b.clone()),
        }
    }

    /// Generate and deserialize a JSON response
    ///
    /// `Ok(None)` when the model returned no JSON or JSON of the wrong shape.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<Option<T>> {
        let Some(value) = self.generate_json_value(prompt).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                tracing::debug!(error = %e, "AI JSON did not match expected shape");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl NarrativeBackend for AIClient {
    async fn is_available(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.is_available().await,
            AIClient::Mock(b) => b.is_available().await,
        }
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.generate_text(prompt).await,
            AIClient::Mock(b) => b.generate_text(prompt).await,
        }
    }

    async fn generate_json_value(&self, prompt: &str) -> Result<Option<serde_json::Value>> {
        match self {
            AIClient::Ollama(b) => b.generate_json_value(prompt).await,
            AIClient::Mock(b) => b.generate_json_value(prompt).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
