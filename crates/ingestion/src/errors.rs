//! Ingestion error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Chunking error: {0}")]
    ChunkingError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<IngestionError> for docchat_common::AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::PdfParseError { path, message } => {
                docchat_common::AppError::Ingestion { path, message }
            }
            IngestionError::FileNotFound(path) => docchat_common::AppError::Ingestion {
                path,
                message: "file not found".to_string(),
            },
            other => docchat_common::AppError::Ingestion {
                path: String::new(),
                message: other.to_string(),
            },
        }
    }
}
