//! Merge-dedup context assembly
//!
//! Merges the two ranked candidate lists into a single ordered,
//! duplicate-free passage list and renders it into a citation-annotated
//! context string. Dense results come first, so they win ties.
//!
//! Duplicates are detected by a coarse fingerprint: the content trimmed of
//! surrounding whitespace, truncated to its first
//! [`DEFAULT_DEDUP_PREFIX_CHARS`] characters. Two passages sharing the
//! prefix are treated as the same passage even if their full text differs
//! after that point.

use docchat_common::corpus::Passage;
use std::collections::HashSet;

/// Default length of the dedup fingerprint, in characters
pub const DEFAULT_DEDUP_PREFIX_CHARS: usize = 50;

/// Result of merging the two candidate lists
#[derive(Debug, Clone, Default)]
pub struct MergedContext {
    /// Citation-annotated context string fed to synthesis
    pub context: String,

    /// One `{source}, page {page}` entry per retained passage, in order
    pub citations: Vec<String>,

    /// Retained passages, in first-seen order
    pub passages: Vec<Passage>,
}

/// Merge dense and lexical candidates into a deduplicated context
///
/// Walks dense results then lexical results, keeping a passage the first
/// time its fingerprint is seen. Output order is deterministic given
/// deterministic inputs; no passage appears twice in the citations.
pub fn merge(dense: &[Passage], lexical: &[Passage], dedup_prefix_chars: usize) -> MergedContext {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = MergedContext::default();

    for passage in dense.iter().chain(lexical.iter()) {
        let key = dedup_key(&passage.content, dedup_prefix_chars);
        if !seen.insert(key) {
            continue;
        }

        merged.citations.push(passage.citation());
        merged.context.push_str(&format!(
            "\n[Source: {}, page {}]\n{}\n",
            passage.source_label(),
            passage.page_label(),
            passage.content
        ));
        merged.passages.push(passage.clone());
    }

    merged
}

/// Fingerprint used to detect duplicate passages across retrievers
fn dedup_key(content: &str, prefix_chars: usize) -> String {
    content.trim().chars().take(prefix_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, source: &str, page: i64) -> Passage {
        Passage::new(content, source, page)
    }

    #[test]
    fn test_disjoint_inputs_concatenate_dense_first() {
        let dense = vec![
            passage("Alpha text about retrieval", "a.pdf", 1),
            passage("Bravo text about indexes", "a.pdf", 2),
        ];
        let lexical = vec![
            passage("Charlie text about ranking", "b.pdf", 3),
            passage("Delta text about fusion", "b.pdf", 4),
        ];

        let merged = merge(&dense, &lexical, DEFAULT_DEDUP_PREFIX_CHARS);

        assert_eq!(merged.passages.len(), dense.len() + lexical.len());
        assert_eq!(merged.passages[0].content, "Alpha text about retrieval");
        assert_eq!(merged.passages[1].content, "Bravo text about indexes");
        assert_eq!(merged.passages[2].content, "Charlie text about ranking");
        assert_eq!(merged.passages[3].content, "Delta text about fusion");
    }

    #[test]
    fn test_duplicate_keeps_first_occurrence() {
        let shared = passage("Alpha text shared by both retrievers", "a.pdf", 1);
        let dense = vec![shared.clone()];
        let lexical = vec![shared.clone(), passage("Beta text", "b.pdf", 2)];

        let merged = merge(&dense, &lexical, DEFAULT_DEDUP_PREFIX_CHARS);

        assert_eq!(merged.passages.len(), 2);
        assert_eq!(merged.passages[0], shared);
        assert_eq!(
            merged.citations,
            vec!["a.pdf, page 1".to_string(), "b.pdf, page 2".to_string()]
        );
    }

    #[test]
    fn test_empty_inputs_yield_empty_output() {
        let merged = merge(&[], &[], DEFAULT_DEDUP_PREFIX_CHARS);
        assert_eq!(merged.context, "");
        assert!(merged.citations.is_empty());
        assert!(merged.passages.is_empty());
    }

    #[test]
    fn test_citation_count_matches_distinct_prefixes() {
        let dense = vec![
            passage("one fish", "a.pdf", 1),
            passage("two fish", "a.pdf", 2),
        ];
        let lexical = vec![
            passage("one fish", "b.pdf", 9),
            passage("red fish", "b.pdf", 3),
        ];

        let merged = merge(&dense, &lexical, DEFAULT_DEDUP_PREFIX_CHARS);
        // Three distinct prefixes in the union of inputs
        assert_eq!(merged.citations.len(), 3);
    }

    #[test]
    fn test_coarse_prefix_collapses_divergent_tails() {
        // Same first 50 characters, different content afterwards: by policy
        // these are duplicates
        let prefix = "This exact prefix is precisely fifty characters!!!";
        assert_eq!(prefix.chars().count(), 50);

        let first = passage(&format!("{} tail one", prefix), "a.pdf", 1);
        let second = passage(&format!("{} completely different tail", prefix), "b.pdf", 2);

        let merged = merge(&[first.clone()], &[second], DEFAULT_DEDUP_PREFIX_CHARS);

        assert_eq!(merged.passages.len(), 1);
        assert_eq!(merged.passages[0], first);
        assert_eq!(merged.citations, vec!["a.pdf, page 1".to_string()]);
    }

    #[test]
    fn test_dedup_trims_before_truncating() {
        let merged = merge(
            &[passage("  padded content  ", "a.pdf", 1)],
            &[passage("padded content", "b.pdf", 2)],
            DEFAULT_DEDUP_PREFIX_CHARS,
        );
        assert_eq!(merged.passages.len(), 1);
    }

    #[test]
    fn test_context_block_rendering() {
        let merged = merge(
            &[passage("Alpha text...", "a.pdf", 1)],
            &[],
            DEFAULT_DEDUP_PREFIX_CHARS,
        );
        assert_eq!(merged.context, "\n[Source: a.pdf, page 1]\nAlpha text...\n");
    }

    #[test]
    fn test_missing_metadata_fallbacks() {
        let bare = Passage::bare("Orphan text with no metadata");
        let merged = merge(&[bare], &[], DEFAULT_DEDUP_PREFIX_CHARS);

        assert_eq!(merged.citations, vec!["unknown.pdf, page N/A".to_string()]);
        assert!(merged
            .context
            .starts_with("\n[Source: unknown.pdf, page N/A]\n"));
    }

    #[test]
    fn test_scenario_from_contract() {
        // dense=[P1], lexical=[P1 duplicate, P2]
        let p1 = passage("Alpha text...", "a.pdf", 1);
        let p2 = passage("Beta text...", "b.pdf", 2);

        let merged = merge(
            &[p1.clone()],
            &[p1.clone(), p2.clone()],
            DEFAULT_DEDUP_PREFIX_CHARS,
        );

        assert_eq!(merged.passages, vec![p1, p2]);
        assert_eq!(
            merged.citations,
            vec!["a.pdf, page 1".to_string(), "b.pdf, page 2".to_string()]
        );
    }

    #[test]
    fn test_prefix_length_is_counted_in_chars() {
        // Multi-byte characters must not split; 3-char prefix over CJK text
        let first = passage("日本語のテキスト", "a.pdf", 1);
        let second = passage("日本語の別のテキスト", "b.pdf", 2);

        let merged = merge(&[first], &[second], 3);
        assert_eq!(merged.passages.len(), 1);
    }
}
