use std::time::Duration;

use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Options for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Hard deadline for the outbound request.
    pub timeout: Duration,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
        }
    }
}

impl GenerateOptions {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(secs),
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// check if the provider is reachable and credentialed
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// single-shot text completion for a fully rendered prompt
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ApiError>;

    /// generate embeddings for a batch of inputs
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
