//! DocChat Retrieval
//!
//! Provides the dual-retriever core:
//! - Dense search (semantic similarity via embeddings)
//! - Lexical search (BM25 ranking)
//! - Merge-dedup context assembly with citations
//!
//! Both indexes are built once per corpus and are read-only thereafter;
//! concurrent reads are safe without locking.

mod dense;
mod hybrid;
mod lexical;
mod merge;

pub use dense::DenseIndex;
pub use hybrid::DualRetriever;
pub use lexical::Bm25Index;
pub use merge::{merge, MergedContext, DEFAULT_DEDUP_PREFIX_CHARS};

use docchat_common::corpus::Passage;
use serde::{Deserialize, Serialize};

/// Retrieval mode a candidate came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Embedding similarity search
    Dense,
    /// BM25 lexical search
    Lexical,
}

/// A passage with the relevance score one retriever assigned it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The retrieved passage
    pub passage: Passage,

    /// Relevance score (retriever-specific scale)
    pub score: f32,

    /// Retrieval mode used
    pub mode: RetrievalMode,
}
