//! Chat engine
//!
//! The per-turn pipeline: retrieve, merge, assemble prompt, synthesize,
//! append to session history. Each turn runs to completion before its
//! session accepts the next; independent sessions may run concurrently
//! because the indexes are read-only and the session store is guarded.

use crate::llm::LlmClient;
use crate::prompt::build_prompt;
use crate::session::{Role, SessionStore};
use docchat_common::errors::{AppError, Result};
use docchat_retrieval::{merge, DualRetriever};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Answer for one turn, with the citations backing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub citations: Vec<String>,
}

/// Orchestrates retrieval, synthesis, and session bookkeeping
pub struct ChatEngine {
    retriever: DualRetriever,
    llm: Arc<dyn LlmClient>,
    sessions: Arc<SessionStore>,
    dedup_prefix_chars: usize,
}

impl ChatEngine {
    pub fn new(
        retriever: DualRetriever,
        llm: Arc<dyn LlmClient>,
        sessions: Arc<SessionStore>,
        dedup_prefix_chars: usize,
    ) -> Self {
        Self {
            retriever,
            llm,
            sessions,
            dedup_prefix_chars,
        }
    }

    /// Number of passages in the indexed corpus
    pub fn corpus_len(&self) -> usize {
        self.retriever.len()
    }

    /// Answer one question within a session
    ///
    /// The session is created on first use. History is appended only after
    /// synthesis succeeds, so a failed turn leaves the session unchanged.
    #[instrument(skip(self, question), fields(session_id = %session_id))]
    pub async fn ask(&self, session_id: Uuid, question: &str) -> Result<ChatAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidState {
                message: "no user question provided".to_string(),
            });
        }

        let session = self.sessions.get_or_create(session_id).await;

        let (dense, lexical) = self.retriever.retrieve(question).await?;
        let merged = merge(&dense, &lexical, self.dedup_prefix_chars);

        let prompt = build_prompt(&merged.context, &session.turns, question);
        let answer = self.llm.generate(&prompt).await?;

        self.sessions
            .append_turn(session_id, Role::User, question)
            .await;
        self.sessions
            .append_turn(session_id, Role::Assistant, answer.clone())
            .await;

        info!(
            passage_count = merged.passages.len(),
            citation_count = merged.citations.len(),
            "Turn answered"
        );

        Ok(ChatAnswer {
            answer,
            citations: merged.citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use docchat_common::corpus::Passage;
    use docchat_common::embeddings::MockEmbedder;

    async fn engine_with(passages: &[Passage], llm: Arc<MockLlm>) -> ChatEngine {
        let retriever = DualRetriever::build(passages, Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();
        ChatEngine::new(retriever, llm, Arc::new(SessionStore::new()), 50)
    }

    #[tokio::test]
    async fn test_empty_question_is_invalid_state() {
        let llm = Arc::new(MockLlm::new("unused"));
        let engine = engine_with(&[], llm).await;

        let err = engine.ask(Uuid::new_v4(), "   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_empty_corpus_still_answers() {
        let llm = Arc::new(MockLlm::new("no-context answer"));
        let engine = engine_with(&[], llm.clone()).await;

        let result = engine.ask(Uuid::new_v4(), "anything?").await.unwrap();
        assert_eq!(result.answer, "no-context answer");
        assert!(result.citations.is_empty());

        // The prompt went out with an empty context section
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context:\n\n"));
    }

    #[tokio::test]
    async fn test_ask_appends_two_turns() {
        let llm = Arc::new(MockLlm::new("the answer"));
        let sessions = Arc::new(SessionStore::new());
        let retriever = DualRetriever::build(&[], Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();
        let engine = ChatEngine::new(retriever, llm, sessions.clone(), 50);

        let session_id = sessions.create().await;
        engine.ask(session_id, "first question").await.unwrap();

        let turns = sessions.list_turns(session_id).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text, "first question");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text, "the answer");
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_session_unchanged() {
        let llm = Arc::new(MockLlm::failing());
        let sessions = Arc::new(SessionStore::new());
        let retriever = DualRetriever::build(&[], Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();
        let engine = ChatEngine::new(retriever, llm, sessions.clone(), 50);

        let session_id = sessions.create().await;
        let err = engine.ask(session_id, "doomed question").await.unwrap_err();
        assert!(matches!(err, AppError::Dependency { .. }));

        assert!(sessions.list_turns(session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_replayed_into_prompt() {
        let llm = Arc::new(MockLlm::new("ack"));
        let sessions = Arc::new(SessionStore::new());
        let retriever = DualRetriever::build(&[], Arc::new(MockEmbedder::new(8)), 4)
            .await
            .unwrap();
        let engine = ChatEngine::new(retriever, llm.clone(), sessions.clone(), 50);

        let session_id = sessions.create().await;
        engine.ask(session_id, "first").await.unwrap();
        engine.ask(session_id, "second").await.unwrap();

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("User: first"));
        assert!(prompts[1].contains("AI: ack"));
        assert!(prompts[1].contains("Latest Question:\nsecond"));
    }

    #[tokio::test]
    async fn test_citations_come_from_retrieved_passages() {
        let passages = vec![
            Passage::new("the borrow checker enforces aliasing rules", "book.pdf", 12),
            Passage::new("tokio schedules asynchronous tasks", "book.pdf", 90),
        ];
        let llm = Arc::new(MockLlm::new("cited answer"));
        let engine = engine_with(&passages, llm).await;

        let result = engine
            .ask(Uuid::new_v4(), "what does the borrow checker do?")
            .await
            .unwrap();

        assert!(!result.citations.is_empty());
        assert!(result
            .citations
            .iter()
            .all(|c| c.starts_with("book.pdf, page ")));
    }
}
