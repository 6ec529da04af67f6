//! Document loading
//!
//! Ties extraction and chunking together: a PDF file in, a sequence of
//! passages with source and page metadata out.

use crate::chunker::chunk_text;
use crate::errors::IngestionError;
use crate::pdf::extract_pages;
use docchat_common::config::ChunkingConfig;
use docchat_common::corpus::Passage;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{error, info, instrument};

/// Result of ingesting one document
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    /// File name the passages are attributed to
    pub source: String,
    /// SHA-256 of the file contents
    pub content_hash: String,
    /// Chunked passages, in document order
    pub passages: Vec<Passage>,
}

/// Load a PDF and split it into passages
///
/// Each passage carries the file name as its source and the 1-based page
/// number it was chunked from.
#[instrument(skip(config), fields(path = %path.display()))]
pub fn load_and_chunk(
    path: &Path,
    config: &ChunkingConfig,
) -> Result<IngestedDocument, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::FileNotFound(path.display().to_string()));
    }

    let source = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let content_hash = file_hash(path)?;

    let pages = extract_pages(path)?;

    let mut passages = Vec::new();
    for page in &pages {
        for chunk in chunk_text(&page.text, config) {
            passages.push(Passage::new(chunk, source.clone(), page.page as i64));
        }
    }

    if passages.is_empty() {
        return Err(IngestionError::ChunkingError(format!(
            "no passages produced for {}",
            source
        )));
    }

    info!(
        source = %source,
        page_count = pages.len(),
        passage_count = passages.len(),
        content_hash = %content_hash,
        "Document ingested"
    );

    Ok(IngestedDocument {
        source,
        content_hash,
        passages,
    })
}

/// Ingest every PDF in a directory
///
/// Files that fail to parse are logged and skipped; a malformed document
/// never affects the others.
#[instrument(skip(config), fields(dir = %dir.display()))]
pub fn ingest_directory(
    dir: &Path,
    config: &ChunkingConfig,
) -> Result<Vec<IngestedDocument>, IngestionError> {
    let mut results = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.extension().map(|e| e == "pdf").unwrap_or(false) {
            match load_and_chunk(&path, config) {
                Ok(doc) => results.push(doc),
                Err(e) => {
                    error!(
                        path = %path.display(),
                        error = %e,
                        "Failed to ingest PDF, skipping"
                    );
                }
            }
        }
    }

    info!(total = results.len(), "Directory ingestion complete");

    Ok(results)
}

/// SHA-256 of a file's contents, hex encoded
fn file_hash(path: &Path) -> Result<String, IngestionError> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_and_chunk(Path::new("/no/such.pdf"), &ChunkingConfig::default());
        assert!(matches!(err, Err(IngestionError::FileNotFound(_))));
    }

    #[test]
    fn test_unparseable_pdf_is_isolated() {
        // A directory with one bogus PDF ingests to an empty result set
        // instead of an error
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf at all").unwrap();

        let docs = ingest_directory(dir.path(), &ChunkingConfig::default()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_file_hash_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.pdf");
        std::fs::write(&path, b"same bytes").unwrap();

        let first = file_hash(&path).unwrap();
        let second = file_hash(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}
