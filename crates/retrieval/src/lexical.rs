//! BM25 lexical search
//!
//! In-memory term-frequency ranking over the passage corpus, built once at
//! corpus-load time. Standard parameters k1 = 1.2, b = 0.75.

use crate::{RetrievalMode, ScoredPassage};
use docchat_common::corpus::Passage;
use std::collections::HashMap;
use tracing::debug;

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// BM25 index over a passage corpus
pub struct Bm25Index {
    docs: Vec<IndexedDoc>,
    doc_freqs: HashMap<String, usize>,
    avg_doc_len: f32,
}

struct IndexedDoc {
    passage: Passage,
    term_freqs: HashMap<String, usize>,
    token_count: usize,
}

impl Bm25Index {
    /// Build the index from the full passage set
    pub fn build(passages: &[Passage]) -> Self {
        let mut docs = Vec::with_capacity(passages.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        let mut total_tokens = 0usize;

        for passage in passages {
            let tokens = tokenize(&passage.content);
            let mut term_freqs: HashMap<String, usize> = HashMap::new();
            for token in &tokens {
                *term_freqs.entry(token.clone()).or_insert(0) += 1;
            }

            for term in term_freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }

            total_tokens += tokens.len();
            docs.push(IndexedDoc {
                passage: passage.clone(),
                term_freqs,
                token_count: tokens.len(),
            });
        }

        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            total_tokens as f32 / docs.len() as f32
        };

        debug!(
            passage_count = docs.len(),
            vocabulary = doc_freqs.len(),
            avg_doc_len,
            "Lexical index built"
        );

        Self {
            docs,
            doc_freqs,
            avg_doc_len,
        }
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Top-k passages by BM25 score for the query
    ///
    /// Only passages with a positive score are returned. Order is
    /// deterministic: score descending, insertion order as the tiebreak.
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredPassage> {
        if self.docs.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let doc_count = self.docs.len() as f32;

        let mut scored: Vec<(usize, f32)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, self.score_doc(doc, &query_terms, doc_count)))
            .filter(|(_, score)| *score > 0.0)
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
                passage: self.docs[i].passage.clone(),
                score,
                mode: RetrievalMode::Lexical,
            })
            .collect()
    }

    fn score_doc(&self, doc: &IndexedDoc, query_terms: &[String], doc_count: f32) -> f32 {
        let mut score = 0.0;

        for term in query_terms {
            let tf = match doc.term_freqs.get(term) {
                Some(&tf) => tf as f32,
                None => continue,
            };

            let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
            let idf = ((doc_count - df + 0.5) / (df + 0.5) + 1.0).ln();

            let norm = 1.0 - B + B * (doc.token_count as f32 / self.avg_doc_len);
            score += idf * (tf * (K1 + 1.0)) / (tf + K1 * norm);
        }

        score
    }
}

/// Normalize text into search terms
///
/// Lowercased alphanumeric tokens of more than two characters, matching
/// how queries are prepared.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| w.len() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str) -> Passage {
        Passage::new(text, "test.pdf", 1)
    }

    #[test]
    fn test_tokenize_drops_short_and_punct() {
        let tokens = tokenize("The cat, sat on a mat-2!");
        assert_eq!(tokens, vec!["the", "cat", "sat", "mat2"]);
    }

    #[test]
    fn test_term_bearing_doc_ranks_first() {
        let index = Bm25Index::build(&[
            passage("rust ownership and borrowing rules"),
            passage("garbage collection in managed runtimes"),
            passage("ownership is checked at compile time"),
        ]);

        let results = index.search("ownership", 3);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passage.content.contains("ownership"));
            assert!(result.score > 0.0);
        }
    }

    #[test]
    fn test_repeated_term_scores_higher() {
        let index = Bm25Index::build(&[
            passage("parser parser parser implementation"),
            passage("parser mention once among many other unrelated words here"),
        ]);

        let results = index.search("parser", 2);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].passage.content,
            "parser parser parser implementation"
        );
    }

    #[test]
    fn test_empty_corpus_returns_empty() {
        let index = Bm25Index::build(&[]);
        assert!(index.search("anything", 4).is_empty());
    }

    #[test]
    fn test_no_match_returns_empty() {
        let index = Bm25Index::build(&[passage("completely unrelated content")]);
        assert!(index.search("zebra", 4).is_empty());
    }

    #[test]
    fn test_query_of_short_words_returns_empty() {
        let index = Bm25Index::build(&[passage("an it of at")]);
        assert!(index.search("an it", 4).is_empty());
    }
}
