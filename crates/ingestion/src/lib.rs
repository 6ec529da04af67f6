//! DocChat Ingestion
//!
//! Turns raw PDF documents into normalized passages with source and page
//! metadata. Extraction and chunking run once per document; the resulting
//! passages are immutable.

pub mod chunker;
pub mod errors;
pub mod loader;
pub mod pdf;

pub use errors::IngestionError;
pub use loader::{ingest_directory, load_and_chunk, IngestedDocument};
