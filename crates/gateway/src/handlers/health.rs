//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub indexed_passages: usize,
}

/// Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: docchat_common::VERSION,
    })
}

/// Readiness check, reporting corpus size
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let engine = state.engine.read().await;
    Json(ReadyResponse {
        status: "ok",
        indexed_passages: engine.corpus_len(),
    })
}
