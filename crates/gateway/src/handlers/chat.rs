//! Chat handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use docchat_common::errors::{AppError, Result};

/// Ask request
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    /// Conversation to continue; a new one is created when absent
    pub session_id: Option<Uuid>,

    #[validate(length(min = 1, max = 4000))]
    pub question: String,
}

/// Ask response
#[derive(Serialize)]
pub struct AskResponse {
    pub session_id: Uuid,
    pub answer: String,
    pub citations: Vec<String>,
}

/// Answer a question against the indexed corpus
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;

    // First interaction creates the session implicitly
    let session_id = match request.session_id {
        Some(id) => id,
        None => state.sessions.create().await,
    };

    // Clone the handle out so a concurrent ingest doesn't block the turn
    let engine = state.engine.read().await.clone();
    let result = engine.ask(session_id, &request.question).await?;

    Ok(Json(AskResponse {
        session_id,
        answer: result.answer,
        citations: result.citations,
    }))
}
