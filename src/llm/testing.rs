//! Scripted provider for exercising chat and recommendation paths in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::{GenerateOptions, LlmProvider};
use crate::core::errors::ApiError;

pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    fail_embeds: AtomicBool,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            fail_embeds: AtomicBool::new(false),
        }
    }

    /// Make subsequent `embed` calls fail, to drive fallback paths.
    pub fn fail_embeds(&self, fail: bool) {
        self.fail_embeds.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, ApiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Internal("scripted provider ran out of replies".to_string()))
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if self.fail_embeds.load(Ordering::SeqCst) {
            return Err(ApiError::Internal("embedding backend offline".to_string()));
        }

        // Deterministic toy embedding: length and vowel count.
        Ok(inputs
            .iter()
            .map(|text| {
                let vowels = text
                    .chars()
                    .filter(|c| "aeiouAEIOU".contains(*c))
                    .count() as f32;
                vec![text.len() as f32, vowels, 1.0]
            })
            .collect())
    }
}
