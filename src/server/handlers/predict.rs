use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::predict::pipeline::WeatherFeatures;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PowerPredictionRequest {
    pub features: WeatherFeatures,
}

/// Accepts weather and solar features and predicts the power output.
pub async fn power_prediction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PowerPredictionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let predicted = state.predictor.predict(&request.features)?;
    tracing::debug!("Predicted power output: {}", predicted);
    Ok(Json(json!({ "predicted_power": predicted })))
}
