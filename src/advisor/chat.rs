//! Advisory chat: subsidy and general solar enquiries.
//!
//! Stateless per request; the conversation history travels in the payload
//! and the new exchange is appended to the returned history.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::ContextStore;
use crate::core::errors::ApiError;
use crate::llm::provider::{GenerateOptions, LlmProvider};
use crate::rag::index::RetrievalIndex;

/// One prior exchange in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug)]
pub struct ChatReply {
    pub answer: String,
    pub history: Vec<ChatExchange>,
}

#[derive(Clone)]
pub struct AdvisoryChat {
    llm: Arc<dyn LlmProvider>,
    context: ContextStore,
    retrieval: Option<Arc<RetrievalIndex>>,
    retrieval_top_k: usize,
}

impl AdvisoryChat {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        context: ContextStore,
        retrieval: Option<Arc<RetrievalIndex>>,
        retrieval_top_k: usize,
    ) -> Self {
        Self {
            llm,
            context,
            retrieval,
            retrieval_top_k,
        }
    }

    /// Answer a subsidy question against the subsidy context only.
    pub async fn subsidy_enquiry(
        &self,
        question: &str,
        history: Vec<ChatExchange>,
        options: &GenerateOptions,
    ) -> Result<ChatReply, ApiError> {
        let context = match self.retrieved_context(question).await {
            Some(block) => block,
            None => self.context.subsidy()?,
        };

        let prompt = format!(
            "\nYou are a helpful assistant specializing in solar panel subsidies based on the following information:\n{context}\n\nAnswer the user's questions clearly and concisely, using the provided information and the conversation history.\n{history}\nUser: {question}\nAgent:",
            context = context,
            history = render_history(&history),
            question = question,
        );

        self.complete(prompt, question, history, options).await
    }

    /// Answer a general solar question against the combined context.
    pub async fn general_enquiry(
        &self,
        question: &str,
        history: Vec<ChatExchange>,
        options: &GenerateOptions,
    ) -> Result<ChatReply, ApiError> {
        let context = match self.retrieved_context(question).await {
            Some(block) => block,
            None => self.context.combined(),
        };

        let prompt = format!(
            "\nYou are a helpful assistant specializing in solar energy in India, covering both general topics and specific subsidy information based on the following context:\n{context}\n\nAnswer the user's questions clearly and concisely, using the provided information and the conversation history.\n{history}\nUser: {question}\nAgent:",
            context = context,
            history = render_history(&history),
            question = question,
        );

        self.complete(prompt, question, history, options).await
    }

    async fn complete(
        &self,
        prompt: String,
        question: &str,
        mut history: Vec<ChatExchange>,
        options: &GenerateOptions,
    ) -> Result<ChatReply, ApiError> {
        let answer = self.llm.generate(&prompt, options).await?;

        history.push(ChatExchange {
            prompt: Some(question.to_string()),
            answer: Some(answer.clone()),
        });

        Ok(ChatReply { answer, history })
    }

    /// Top-k chunks for the question when retrieval is on; `None` means use
    /// the static context (retrieval disabled, or the search failed).
    async fn retrieved_context(&self, question: &str) -> Option<String> {
        let index = self.retrieval.as_ref()?;
        match index.context_block(question, self.retrieval_top_k).await {
            Ok(block) if !block.is_empty() => Some(block),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!("Retrieval failed, falling back to static context: {}", err);
                None
            }
        }
    }
}

fn render_history(history: &[ChatExchange]) -> String {
    let mut rendered = String::from("Previous conversation:\n");
    for exchange in history {
        if let Some(prompt) = &exchange.prompt {
            rendered.push_str(&format!("User: {}\n", prompt));
        }
        if let Some(answer) = &exchange.answer {
            rendered.push_str(&format!("Agent: {}\n", answer));
        }
    }
    rendered
}
