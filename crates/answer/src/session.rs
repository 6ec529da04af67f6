//! Conversation session state
//!
//! Per-conversation message history: an append-only turn list keyed by
//! session id, owned by an explicit store rather than ambient state.
//! Sessions live for the process lifetime; there is no eviction and no
//! persistence.

use chrono::{DateTime, Utc};
use docchat_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Prefix used when rendering history into a prompt
    pub fn prompt_prefix(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "AI",
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A single ongoing conversation's accumulated history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub turns: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            turns: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// In-memory session store
///
/// Sessions are created on first interaction or by an explicit
/// new-conversation action. A single caller per session is assumed; the
/// lock only arbitrates between independent sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session and return its id
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, Session::new(id));
        tracing::info!(session_id = %id, "Session created");
        id
    }

    /// Fetch a session, creating it on first use
    pub async fn get_or_create(&self, id: Uuid) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions.entry(id).or_insert_with(|| Session::new(id)).clone()
    }

    /// Append one turn to a session, creating the session on first use
    pub async fn append_turn(&self, id: Uuid, role: Role, text: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id).or_insert_with(|| Session::new(id));
        session.turns.push(ConversationTurn {
            role,
            text: text.into(),
            created_at: Utc::now(),
        });
    }

    /// Ordered turn history of an existing session
    pub async fn list_turns(&self, id: Uuid) -> Result<Vec<ConversationTurn>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .map(|s| s.turns.clone())
            .ok_or_else(|| AppError::SessionNotFound { id: id.to_string() })
    }

    /// Ids of all known sessions
    pub async fn session_ids(&self) -> Vec<Uuid> {
        let sessions = self.sessions.read().await;
        sessions.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_preserves_order() {
        let store = SessionStore::new();
        let id = store.create().await;

        for i in 0..5 {
            store.append_turn(id, Role::User, format!("question {}", i)).await;
            store
                .append_turn(id, Role::Assistant, format!("answer {}", i))
                .await;
        }

        let turns = store.list_turns(id).await.unwrap();
        assert_eq!(turns.len(), 10);
        for (i, pair) in turns.chunks(2).enumerate() {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[0].text, format!("question {}", i));
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].text, format!("answer {}", i));
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        let first = store.get_or_create(id).await;
        store.append_turn(id, Role::User, "hello").await;
        let second = store.get_or_create(id).await;

        assert_eq!(first.id, second.id);
        assert_eq!(second.turns.len(), 1);
    }

    #[tokio::test]
    async fn test_list_turns_unknown_session() {
        let store = SessionStore::new();
        let err = store.list_turns(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(
            err,
            docchat_common::AppError::SessionNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;

        store.append_turn(a, Role::User, "only in a").await;

        assert_eq!(store.list_turns(a).await.unwrap().len(), 1);
        assert!(store.list_turns(b).await.unwrap().is_empty());
        assert_eq!(store.session_ids().await.len(), 2);
    }
}
