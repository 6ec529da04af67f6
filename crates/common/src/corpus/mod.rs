//! Passage data model
//!
//! A passage is a chunk of a source document together with the metadata
//! needed to cite it. Passages are produced once during ingestion and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};

/// Rendered source label when a passage carries no source metadata
pub const UNKNOWN_SOURCE: &str = "unknown.pdf";

/// Rendered page label when a passage carries no page metadata
pub const UNKNOWN_PAGE: &str = "N/A";

/// A chunk of a source document with citation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Chunk text
    pub content: String,

    /// Originating file name, if known
    pub source: Option<String>,

    /// 1-based page number, if known
    pub page: Option<i64>,
}

impl Passage {
    /// Create a passage with full metadata
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: i64) -> Self {
        Self {
            content: content.into(),
            source: Some(source.into()),
            page: Some(page),
        }
    }

    /// Create a passage with no citation metadata
    pub fn bare(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
            page: None,
        }
    }

    /// Source label for citation rendering
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }

    /// Page label for citation rendering
    pub fn page_label(&self) -> String {
        match self.page {
            Some(page) => page.to_string(),
            None => UNKNOWN_PAGE.to_string(),
        }
    }

    /// Citation string in the form `{source}, page {page}`
    pub fn citation(&self) -> String {
        format!("{}, page {}", self.source_label(), self.page_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_with_metadata() {
        let passage = Passage::new("Alpha text", "a.pdf", 1);
        assert_eq!(passage.citation(), "a.pdf, page 1");
    }

    #[test]
    fn test_citation_missing_page() {
        let passage = Passage {
            content: "Beta text".to_string(),
            source: Some("b.pdf".to_string()),
            page: None,
        };
        assert_eq!(passage.citation(), "b.pdf, page N/A");
    }

    #[test]
    fn test_citation_missing_source() {
        let passage = Passage::bare("Gamma text");
        assert_eq!(passage.citation(), "unknown.pdf, page N/A");
    }
}
