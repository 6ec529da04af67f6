//! Prompt assembly
//!
//! Renders the merged context, prior conversation turns, and the latest
//! question into the single prompt string the language model receives.
//! Conversation continuity comes entirely from replaying history here;
//! the model is stateless per call.

use crate::session::ConversationTurn;

const INSTRUCTION: &str = "You are a helpful assistant. Use the context below to answer the question. \
You have to cite the source and source text if you got the answer from the context. \
You don't have to use the context if it is irrelevant.";

/// Build the synthesis prompt for one turn
pub fn build_prompt(context: &str, history: &[ConversationTurn], question: &str) -> String {
    let formatted_history = render_history(history);

    format!(
        "{INSTRUCTION}\n\n\
        Context:\n{context}\n\n\
        Conversation so far:\n{formatted_history}\n\
        Latest Question:\n{question}\n\n\
        Answer:"
    )
}

/// Render prior turns as `User:` / `AI:` lines
fn render_history(history: &[ConversationTurn]) -> String {
    let mut formatted = String::new();
    for turn in history {
        formatted.push_str(&format!("{}: {}\n", turn.role.prompt_prefix(), turn.text));
    }
    formatted
}
