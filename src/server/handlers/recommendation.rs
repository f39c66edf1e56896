use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::advisor::recommendation::RecommendationRequest;
use crate::core::errors::ApiError;
use crate::llm::provider::GenerateOptions;
use crate::state::AppState;

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Generate a personalized solar recommendation based on user inputs.
pub async fn get_solar_recommendation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let options = GenerateOptions::with_timeout_secs(request.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));

    let recommendation = state.recommendations.generate(&request, &options).await?;
    Ok(Json(recommendation))
}
