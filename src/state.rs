use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::advisor::chat::AdvisoryChat;
use crate::advisor::recommendation::RecommendationEngine;
use crate::context::ContextStore;
use crate::core::config::{AppConfig, AppPaths};
use crate::llm::gemini::GeminiProvider;
use crate::llm::provider::LlmProvider;
use crate::predict::pipeline::PowerPredictor;
use crate::rag::chunker::ChunkerConfig;
use crate::rag::index::RetrievalIndex;
use crate::scrape::Scraper;

pub struct AppState {
    pub config: AppConfig,
    pub paths: Arc<AppPaths>,
    pub llm: Arc<dyn LlmProvider>,
    pub chat: AdvisoryChat,
    pub recommendations: RecommendationEngine,
    pub scraper: Scraper,
    pub predictor: PowerPredictor,
    pub retrieval: Option<Arc<RetrievalIndex>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize(paths: Arc<AppPaths>) -> anyhow::Result<Arc<Self>> {
        let config = AppConfig::from_env();

        let api_key = match &config.gemini_api_key {
            Some(key) => key.clone(),
            None => {
                tracing::warn!("GOOGLE_API_KEY is not set; LLM calls will fail");
                String::new()
            }
        };

        let llm: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::new(
            api_key,
            config.generation_model.clone(),
            config.embedding_model.clone(),
        ));

        match llm.health_check().await {
            Ok(true) => tracing::info!("LLM provider '{}' is reachable", llm.name()),
            Ok(false) => tracing::warn!("LLM provider '{}' is not reachable", llm.name()),
            Err(err) => tracing::warn!("LLM provider health check failed: {}", err),
        }

        let context = ContextStore::new(paths.context_dir.clone());

        let retrieval = if config.retrieval_enabled {
            match RetrievalIndex::build(&context, llm.clone(), &ChunkerConfig::default()).await {
                Ok(index) => Some(Arc::new(index)),
                Err(err) => {
                    tracing::warn!(
                        "Retrieval index unavailable, chat will use static context: {}",
                        err
                    );
                    None
                }
            }
        } else {
            None
        };

        let chat = AdvisoryChat::new(
            llm.clone(),
            context.clone(),
            retrieval.clone(),
            config.retrieval_top_k,
        );
        let recommendations = RecommendationEngine::new(llm.clone(), context);
        let scraper = Scraper::new(config.reader_base_url.clone());
        let predictor = PowerPredictor::new(paths.model_dir.clone());

        Ok(Arc::new(AppState {
            config,
            paths,
            llm,
            chat,
            recommendations,
            scraper,
            predictor,
            retrieval,
            started_at: Utc::now(),
        }))
    }
}
