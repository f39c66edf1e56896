use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::llm::provider::GenerateOptions;
use crate::scrape::extraction_prompt;
use crate::state::AppState;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
pub struct ScraperRequest {
    pub url: String,
    pub prompt: String,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ScraperResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time: f64,
}

/// Scrape a website and extract information based on the provided prompt.
///
/// Failures come back inside the response envelope rather than as a 5xx,
/// so the caller always receives the elapsed time.
pub async fn scrape_website(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScraperRequest>,
) -> impl IntoResponse {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, url = %request.url, "scrape request");

    let timeout = Duration::from_secs(request.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let options = GenerateOptions { timeout };

    let result: Result<String, ApiError> = async {
        let content = state.scraper.fetch_rendered(&request.url, timeout).await?;
        let prompt = extraction_prompt(&content, &request.prompt);
        state.llm.generate(&prompt, &options).await
    }
    .await;

    let execution_time = started.elapsed().as_secs_f64();

    match result {
        Ok(data) => Json(ScraperResponse {
            success: true,
            data: Some(data),
            error: None,
            execution_time,
        }),
        Err(err) => {
            tracing::warn!(%request_id, "scrape failed: {}", err);
            Json(ScraperResponse {
                success: false,
                data: None,
                error: Some(err.to_string()),
                execution_time,
            })
        }
    }
}
