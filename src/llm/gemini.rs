//! Gemini provider over the Generative Language REST API.
//!
//! One request per call: `generateContent` for text and
//! `batchEmbedContents` for embeddings. No retries and no streaming;
//! callers decide what to do with a failed attempt.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{GenerateOptions, LlmProvider};
use crate::core::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    generation_model: String,
    embedding_model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, generation_model: String, embedding_model: String) -> Self {
        Self::with_base_url(
            DEFAULT_BASE_URL.to_string(),
            api_key,
            generation_model,
            embedding_model,
        )
    }

    pub fn with_base_url(
        base_url: String,
        api_key: String,
        generation_model: String,
        embedding_model: String,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            generation_model,
            embedding_model,
            client: Client::new(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, method, self.api_key
        )
    }
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/models?key={}&pageSize=1", self.base_url, self.api_key);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, ApiError> {
        let url = self.model_url(&self.generation_model, "generateContent");

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let res = self
            .client
            .post(&url)
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini generate error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let content = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ApiError::Internal("Gemini response contained no text candidate".to_string())
            })?
            .to_string();

        Ok(content)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.model_url(&self.embedding_model, "batchEmbedContents");

        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.embedding_model),
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();

        let res = self
            .client
            .post(&url)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini embed error ({}): {}",
                status, text
            )));
        }

        let payload: BatchEmbedResponse = res.json().await.map_err(ApiError::internal)?;
        Ok(payload
            .embeddings
            .into_iter()
            .map(|entry| entry.values)
            .collect())
    }
}
