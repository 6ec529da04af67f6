//! Text chunking
//!
//! Splits cleaned page text into passage-sized chunks. Two strategies:
//! a semantic splitter for the no-overlap case and a sliding window when
//! overlap is configured (the default, so no semantic unit is strictly
//! confined to one retrieval chunk).

use docchat_common::config::ChunkingConfig;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Split text into chunks honoring the configured overlap
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    if config.chunk_overlap == 0 {
        chunk_without_overlap(text, config)
    } else {
        chunk_with_overlap(text, config)
    }
}

/// Semantic chunking without overlap
fn chunk_without_overlap(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let splitter = TextSplitter::new(ChunkConfig::new(config.chunk_size));

    let chunks: Vec<String> = splitter
        .chunks(text)
        .filter(|c| c.len() >= config.min_chunk_size)
        .map(|c| c.to_string())
        .collect();

    debug!(
        input_len = text.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Text chunked"
    );

    chunks
}

/// Sliding-window chunking with overlap
fn chunk_with_overlap(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();

    if total_len == 0 {
        return chunks;
    }

    let mut start = 0;

    while start < total_len {
        let end = (start + config.chunk_size).min(total_len);
        let window: String = chars[start..end].iter().collect();

        // Try to break at a sentence boundary, except for the final chunk
        let chunk_text = if end < total_len {
            find_sentence_boundary(&window)
        } else {
            window
        };

        if chunk_text.chars().count() >= config.min_chunk_size {
            chunks.push(chunk_text);
        }

        // Move forward with overlap
        let advance = if config.chunk_overlap < config.chunk_size {
            config.chunk_size - config.chunk_overlap
        } else {
            config.chunk_size / 2
        };

        start += advance.max(1);
    }

    debug!(
        input_len = total_len,
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Text chunked with overlap"
    );

    chunks
}

/// Find a good sentence boundary to break at
fn find_sentence_boundary(text: &str) -> String {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    // Search the last 20% of the window for a break point
    let len = text.len();
    let mut search_start = (len as f64 * 0.8) as usize;
    while search_start < len && !text.is_char_boundary(search_start) {
        search_start += 1;
    }
    let search_region = &text[search_start..];

    for ending in sentence_endings.iter() {
        if let Some(pos) = search_region.rfind(ending) {
            let break_pos = search_start + pos + ending.len();
            return text[..break_pos].to_string();
        }
    }

    // No good break found, keep the window as-is
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize, min: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            min_chunk_size: min,
        }
    }

    #[test]
    fn test_basic_chunking() {
        let text = "This is a test. ".repeat(100);
        let chunks = chunk_text(&text, &config(200, 0, 50));
        assert!(!chunks.is_empty());

        for chunk in &chunks {
            assert!(chunk.len() >= 50);
        }
    }

    #[test]
    fn test_overlap_chunking() {
        let text = "Sentence one. Sentence two. Sentence three. Sentence four. Sentence five.";
        let chunks = chunk_text(&text, &config(30, 10, 10));
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn test_overlap_repeats_content() {
        let text: String = ('a'..='z').cycle().take(300).collect();
        let chunks = chunk_text(&text, &config(100, 50, 10));
        // Window advances by size - overlap, so consecutive chunks share a tail
        assert!(chunks.len() > 3);
        let first_tail: String = chunks[0].chars().skip(50).collect();
        assert!(chunks[1].starts_with(&first_tail));
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_default_config_values() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 150);
    }
}
