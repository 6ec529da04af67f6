//! Dense similarity search
//!
//! Exact cosine-similarity scan over passage embeddings. The index is
//! built once from the full passage set and never updated; at the corpus
//! sizes this service handles, a linear scan beats maintaining an ANN
//! structure.

use crate::{RetrievalMode, ScoredPassage};
use docchat_common::corpus::Passage;
use docchat_common::embeddings::Embedder;
use docchat_common::errors::Result;
use std::sync::Arc;
use tracing::debug;

/// Dense vector index over a passage corpus
pub struct DenseIndex {
    entries: Vec<Entry>,
}

struct Entry {
    passage: Passage,
    embedding: Vec<f32>,
}

impl DenseIndex {
    /// Build the index by embedding every passage
    pub async fn build(passages: &[Passage], embedder: Arc<dyn Embedder>) -> Result<Self> {
        if passages.is_empty() {
            return Ok(Self {
                entries: Vec::new(),
            });
        }

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let entries = passages
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(passage, embedding)| Entry { passage, embedding })
            .collect::<Vec<_>>();

        debug!(
            passage_count = entries.len(),
            model = embedder.model_name(),
            "Dense index built"
        );

        Ok(Self { entries })
    }

    /// Build from precomputed embeddings (tests, offline pipelines)
    pub fn from_embeddings(pairs: Vec<(Passage, Vec<f32>)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(passage, embedding)| Entry { passage, embedding })
                .collect(),
        }
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k passages by cosine similarity to the query embedding
    ///
    /// Order is deterministic: score descending, insertion order as the
    /// tiebreak.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredPassage> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredPassage {
                passage: self.entries[i].passage.clone(),
                score,
                mode: RetrievalMode::Dense,
            })
            .collect()
    }
}

/// Cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
