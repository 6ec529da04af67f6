//! Session management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use docchat_answer::ConversationTurn;
use docchat_common::errors::Result;

/// Create session response
#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// Session listing response
#[derive(Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<Uuid>,
}

/// Session history response
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub turns: Vec<ConversationTurn>,
}

/// Explicit new-conversation action
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id }),
    )
}

/// List known conversations
pub async fn list_sessions(State(state): State<AppState>) -> Json<ListSessionsResponse> {
    Json(ListSessionsResponse {
        sessions: state.sessions.session_ids().await,
    })
}

/// Full turn history of one conversation
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let turns = state.sessions.list_turns(session_id).await?;

    Ok(Json(SessionResponse { session_id, turns }))
}
