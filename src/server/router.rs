use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, health, predict, recommendation, scrape};
use crate::state::AppState;

/// Main application router: CORS, request tracing, and the advisory
/// endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { Redirect::temporary("/health") }))
        .route("/health", get(health::health))
        .route("/check", get(health::check))
        .route("/scrape", post(scrape::scrape_website))
        .route("/subsidy-enquiry", post(chat::subsidy_enquiry))
        .route("/general-solar-enquiry", post(chat::general_solar_enquiry))
        .route("/recommendation", post(recommendation::get_solar_recommendation))
        .route("/power_prediction", post(predict::power_prediction))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}
