//! Mock backend for testing
//!
//! Returns predictable responses without a running LLM server.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Error, Result};

use super::NarrativeBackend;

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether the backend reports itself available and answers requests
    pub healthy: bool,
    /// JSON returned by `generate_json_value`
    pub json: serde_json::Value,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            json: json!({
                "steps": [
                    "Mock step one",
                    "Mock step two",
                    "Mock step three"
                ],
                "suggestion": "Mock budget suggestion."
            }),
        }
    }

    /// Create an unhealthy mock backend; every generation call fails
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Return this JSON from every structured request
    pub fn with_json(mut self, json: serde_json::Value) -> Self {
        self.json = json;
        self
    }

    fn check(&self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(Error::Ai("Mock backend is unavailable".into()))
        }
    }
}

#[async_trait]
impl NarrativeBackend for MockBackend {
    async fn is_available(&self) -> bool {
        self.healthy
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.check()?;
        Ok(format!("Mock response ({} chars of prompt)", prompt.len()))
    }

    async fn generate_json_value(&self, _prompt: &str) -> Result<Option<serde_json::Value>> {
        self.check()?;
        Ok(Some(self.json.clone()))
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
