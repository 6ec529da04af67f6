//! Dual retrieval
//!
//! Runs the dense and lexical lookups for one query and returns both
//! ranked candidate lists. Merging happens downstream in [`crate::merge`].

use crate::{Bm25Index, DenseIndex};
use docchat_common::corpus::Passage;
use docchat_common::embeddings::Embedder;
use docchat_common::errors::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Holds both per-corpus indexes plus the query embedder
pub struct DualRetriever {
    dense: DenseIndex,
    lexical: Bm25Index,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl DualRetriever {
    /// Create a retriever over already-built indexes
    pub fn new(
        dense: DenseIndex,
        lexical: Bm25Index,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Self {
        Self {
            dense,
            lexical,
            embedder,
            top_k,
        }
    }

    /// Build both indexes from the full passage set
    ///
    /// This is the one-time barrier: queries are only possible against a
    /// retriever whose construction has completed.
    pub async fn build(
        passages: &[Passage],
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self> {
        let dense = DenseIndex::build(passages, embedder.clone()).await?;
        let lexical = Bm25Index::build(passages);
        Ok(Self::new(dense, lexical, embedder, top_k))
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty() && self.lexical.is_empty()
    }

    /// Run both lookups and return (dense, lexical) candidates
    ///
    /// An empty corpus returns two empty lists without touching the
    /// embedding service: questions degrade to "no context", never an
    /// error.
    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn retrieve(&self, query: &str) -> Result<(Vec<Passage>, Vec<Passage>)> {
        if self.is_empty() {
            debug!("Empty corpus, skipping retrieval");
            return Ok((Vec::new(), Vec::new()));
        }

        // The embedding round-trip overlaps the lexical scan
        let (dense_results, lexical_results) = tokio::join!(
            async {
                let query_embedding = self.embedder.embed(query).await?;
                Ok::<_, docchat_common::AppError>(self.dense.search(&query_embedding, self.top_k))
            },
            async { self.lexical.search(query, self.top_k) },
        );

        let dense_results = dense_results?;

        debug!(
            dense_count = dense_results.len(),
            lexical_count = lexical_results.len(),
            "Dual retrieval complete"
        );

        Ok((
            dense_results.into_iter().map(|s| s.passage).collect(),
            lexical_results.into_iter().map(|s| s.passage).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_common::embeddings::MockEmbedder;

    fn passage(text: &str) -> Passage {
        Passage::new(text, "test.pdf", 1)
    }

    #[tokio::test]
    async fn test_empty_corpus_degrades_to_no_context() {
        let retriever = DualRetriever::build(&[], Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();

        let (dense, lexical) = retriever.retrieve("any question").await.unwrap();
        assert!(dense.is_empty());
        assert!(lexical.is_empty());
    }

    #[tokio::test]
    async fn test_both_sides_respect_top_k() {
        let passages: Vec<Passage> = (0..10)
            .map(|i| passage(&format!("ownership rules example number {}", i)))
            .collect();

        let retriever = DualRetriever::build(&passages, Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();

        let (dense, lexical) = retriever.retrieve("ownership").await.unwrap();
        assert_eq!(dense.len(), 4);
        assert_eq!(lexical.len(), 4);
    }

    #[tokio::test]
    async fn test_lexical_side_matches_terms() {
        let passages = vec![
            passage("the borrow checker enforces aliasing rules"),
            passage("tokio schedules asynchronous tasks"),
        ];

        let retriever = DualRetriever::build(&passages, Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();

        let (_, lexical) = retriever.retrieve("borrow checker").await.unwrap();
        assert_eq!(lexical.len(), 1);
        assert!(lexical[0].content.contains("borrow checker"));
    }
}
