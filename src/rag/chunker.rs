//! Splits context documents into overlapping chunks for the retrieval index.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks
    pub chunk_overlap: usize,
    /// Maximum total chunks per document
    pub max_chunks: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            max_chunks: 200,
        }
    }
}

/// A text chunk with source information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// Source identifier (context file name)
    pub source: String,
    /// Character offset in original document
    pub start_offset: usize,
    /// Chunk index within the source
    pub chunk_index: usize,
}

/// Split text into overlapping chunks, preferring sentence boundaries.
pub fn split_into_chunks(text: &str, source: &str, config: &ChunkerConfig) -> Vec<TextChunk> {
    let chunk_size = config.chunk_size;
    let overlap = config.chunk_overlap;
    let max_chunks = config.max_chunks;

    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();

    if total_chars == 0 {
        return chunks;
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut start = 0;
    let mut chunk_index = 0;

    while start < total_chars && chunks.len() < max_chunks {
        let end = (start + chunk_size).min(total_chars);
        let window: String = chars[start..end].iter().collect();

        let final_text = if end < total_chars {
            trim_to_sentence_boundary(&window)
        } else {
            window
        };

        let trimmed = final_text.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                text: trimmed.to_string(),
                source: source.to_string(),
                start_offset: start,
                chunk_index,
            });
            chunk_index += 1;
        }

        start += step;
    }

    chunks
}

/// Cut the chunk at the last sentence ending in its final fifth, if any.
fn trim_to_sentence_boundary(text: &str) -> String {
    let endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let search_start = text
        .char_indices()
        .map(|(idx, _)| idx)
        .nth(text.chars().count() * 80 / 100)
        .unwrap_or(0);
    let tail = &text[search_start..];

    for ending in endings.iter() {
        if let Some(pos) = tail.rfind(ending) {
            let cut = search_start + pos + ending.len();
            return text[..cut].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_with_overlap_and_cap() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 20,
            max_chunks: 5,
        };
        let text = "Subsidy rates differ per state. ".repeat(40);
        let chunks = split_into_chunks(&text, "subsidy_info.md", &config);

        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.source == "subsidy_info.md"));
        assert!(chunks.windows(2).all(|w| w[0].start_offset < w[1].start_offset));
    }

    #[test]
    fn prefers_sentence_boundaries() {
        let config = ChunkerConfig {
            chunk_size: 60,
            chunk_overlap: 0,
            max_chunks: 10,
        };
        let text = "First sentence here. Second sentence follows after. Third one closes the text out fully.";
        let chunks = split_into_chunks(text, "test", &config);

        assert!(chunks.len() >= 2);
        assert!(chunks[0].text.ends_with('.'));
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = split_into_chunks("", "test", &ChunkerConfig::default());
        assert!(chunks.is_empty());
    }
}
