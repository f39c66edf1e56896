use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": state.llm.name(),
        "retrieval_index": state.retrieval.is_some(),
        "prediction_ready": state.predictor.is_ready(),
        "started_at": state.started_at,
    }))
}

pub async fn check() -> impl IntoResponse {
    let now = Utc::now();
    Json(json!({
        "status": "working",
        "timestamp": now.timestamp_millis() as f64 / 1000.0,
    }))
}
