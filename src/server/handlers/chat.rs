use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::advisor::chat::ChatExchange;
use crate::core::errors::ApiError;
use crate::llm::provider::GenerateOptions;
use crate::state::AppState;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
pub struct SubsidyQuery {
    /// User's current question/message.
    pub prompt: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Previous conversation exchanges.
    #[serde(default)]
    pub response: Vec<ChatExchange>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub prev_responses: Vec<ChatExchange>,
    pub execution_time: f64,
}

/// Process a subsidy enquiry chat request.
pub async fn subsidy_enquiry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubsidyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let started = Instant::now();
    let options = GenerateOptions::with_timeout_secs(request.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

    let reply = state
        .chat
        .subsidy_enquiry(&request.prompt, request.response, &options)
        .await?;

    Ok(Json(ChatResponse {
        answer: reply.answer,
        prev_responses: reply.history,
        execution_time: started.elapsed().as_secs_f64(),
    }))
}

/// Process a general solar energy enquiry chat request.
pub async fn general_solar_enquiry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubsidyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let started = Instant::now();
    let options = GenerateOptions::with_timeout_secs(request.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

    let reply = state
        .chat
        .general_enquiry(&request.prompt, request.response, &options)
        .await?;

    Ok(Json(ChatResponse {
        answer: reply.answer,
        prev_responses: reply.history,
        execution_time: started.elapsed().as_secs_f64(),
    }))
}
