//! In-memory vector index over the context store.
//!
//! Built once at startup: every context document is chunked, each chunk is
//! embedded, and queries run a brute-force cosine scan. The corpus is two
//! markdown files, so anything fancier would be wasted.

use std::cmp::Ordering;
use std::sync::Arc;

use ndarray::Array1;

use crate::context::ContextStore;
use crate::core::errors::ApiError;
use crate::llm::provider::LlmProvider;

use super::chunker::{split_into_chunks, ChunkerConfig, TextChunk};

/// A chunk scored against a query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

pub struct RetrievalIndex {
    llm: Arc<dyn LlmProvider>,
    chunks: Vec<TextChunk>,
    embeddings: Vec<Array1<f32>>,
}

impl RetrievalIndex {
    /// Chunk and embed every context document. Returns an error if there is
    /// nothing to index or the embedding call fails; the caller decides
    /// whether that is fatal.
    pub async fn build(
        store: &ContextStore,
        llm: Arc<dyn LlmProvider>,
        config: &ChunkerConfig,
    ) -> Result<Self, ApiError> {
        let mut chunks = Vec::new();
        for (source, content) in store.documents() {
            chunks.extend(split_into_chunks(&content, &source, config));
        }

        if chunks.is_empty() {
            return Err(ApiError::Internal(
                "No context documents available to index".to_string(),
            ));
        }

        let inputs: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let raw = llm.embed(&inputs).await?;
        if raw.len() != chunks.len() {
            return Err(ApiError::Internal(format!(
                "Embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                raw.len()
            )));
        }

        let embeddings = raw.into_iter().map(Array1::from_vec).collect();

        tracing::info!("Retrieval index built with {} chunks", chunks.len());

        Ok(Self {
            llm,
            chunks,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Embed the query and return the top-k chunks by cosine similarity.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, ApiError> {
        let query_vecs = self.llm.embed(&[query.to_string()]).await?;
        let query_vec = query_vecs
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("Empty embedding for query".to_string()))?;
        let query = Array1::from_vec(query_vec);

        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .zip(self.embeddings.iter())
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query, embedding),
            })
            .collect();

        scored.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Render the top-k chunks for `query` as a context block for prompts.
    pub async fn context_block(&self, query: &str, k: usize) -> Result<String, ApiError> {
        let hits = self.search(query, k).await?;
        let sections: Vec<String> = hits
            .iter()
            .map(|hit| format!("[{}] {}", hit.chunk.source, hit.chunk.text))
            .collect();
        Ok(sections.join("\n\n"))
    }
}

fn cosine_similarity(left: &Array1<f32>, right: &Array1<f32>) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let dot = left.dot(right);
    let denom = left.dot(left).sqrt() * right.dot(right).sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
