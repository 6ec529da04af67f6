//! DocChat Answer Engine
//!
//! Composes the per-turn pipeline: dual retrieval, merge-dedup, prompt
//! assembly, language-model synthesis, and session bookkeeping. The
//! pipeline is a plain ordered function composition; there is no graph
//! engine behind it.

pub mod engine;
pub mod llm;
pub mod prompt;
pub mod session;

pub use engine::{ChatAnswer, ChatEngine};
pub use llm::{LlmClient, MockLlm, OpenAiChatClient};
pub use session::{ConversationTurn, Role, Session, SessionStore};
