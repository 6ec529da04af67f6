//! Document ingestion handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use docchat_answer::ChatEngine;
use docchat_common::errors::{AppError, Result};
use docchat_ingestion::{load_and_chunk, IngestedDocument};
use docchat_retrieval::DualRetriever;

/// Ingest request: local PDF paths forming the new corpus
#[derive(Debug, Deserialize, Validate)]
pub struct IngestRequest {
    #[validate(length(min = 1, message = "at least one path required"))]
    pub paths: Vec<String>,
}

/// Per-document ingestion summary
#[derive(Serialize)]
pub struct DocumentSummary {
    pub source: String,
    pub passage_count: usize,
    pub content_hash: String,
}

/// A file that failed ingestion and was skipped
#[derive(Serialize)]
pub struct SkippedDocument {
    pub path: String,
    pub error: String,
}

/// Ingest response
#[derive(Serialize)]
pub struct IngestResponse {
    pub documents: Vec<DocumentSummary>,
    pub skipped: Vec<SkippedDocument>,
    pub indexed_passages: usize,
}

/// Ingest a set of PDFs and rebuild the retrieval indexes
///
/// The indexes are built once from the full passage set and replace the
/// previous corpus wholesale; ingestion completes before any query sees
/// the new engine. Files that fail to parse are skipped and reported,
/// leaving the successfully ingested documents intact.
pub async fn ingest_documents(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let chunking = state.config.chunking.clone();
    let paths: Vec<PathBuf> = request.paths.iter().map(PathBuf::from).collect();

    // PDF parsing is blocking work
    let outcome = tokio::task::spawn_blocking(move || {
        let mut documents: Vec<IngestedDocument> = Vec::new();
        let mut skipped: Vec<(String, String)> = Vec::new();

        for path in &paths {
            match load_and_chunk(path, &chunking) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Skipping document");
                    skipped.push((path.display().to_string(), e.to_string()));
                }
            }
        }

        (documents, skipped)
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("ingestion task failed: {}", e),
    })?;

    let (documents, skipped) = outcome;

    let passages: Vec<_> = documents
        .iter()
        .flat_map(|d| d.passages.iter().cloned())
        .collect();

    let retriever = DualRetriever::build(
        &passages,
        state.embedder.clone(),
        state.config.retrieval.top_k,
    )
    .await?;

    let engine = ChatEngine::new(
        retriever,
        state.llm.clone(),
        state.sessions.clone(),
        state.config.retrieval.dedup_prefix_chars,
    );

    // Swap the engine in one step so queries see either the old corpus or
    // the complete new one
    *state.engine.write().await = Arc::new(engine);

    tracing::info!(
        document_count = documents.len(),
        skipped_count = skipped.len(),
        passage_count = passages.len(),
        "Corpus ingested"
    );

    Ok(Json(IngestResponse {
        documents: documents
            .into_iter()
            .map(|d| DocumentSummary {
                source: d.source,
                passage_count: d.passages.len(),
                content_hash: d.content_hash,
            })
            .collect(),
        skipped: skipped
            .into_iter()
            .map(|(path, error)| SkippedDocument { path, error })
            .collect(),
        indexed_passages: passages.len(),
    }))
}
