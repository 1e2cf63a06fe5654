//! Agent module - the tool-using conversation loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user message to the conversation
//! 2. Ask the reasoning engine for the next step, offering the tool list
//! 3. If it requests tool calls, run them concurrently and feed the results back
//! 4. Repeat until it produces a final answer or the round bound is reached

mod agent_loop;
mod prompt;

use thiserror::Error;

use crate::conversation::ConversationError;
use crate::llm::LlmError;

pub use agent_loop::{Agent, AgentSettings, DEFAULT_MAX_ROUNDS};
pub use prompt::build_system_prompt;

/// Errors that end a turn. Tool failures never show up here; they are recorded
/// in the conversation for the model to react to.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("reasoning engine failed: {0}")]
    ReasoningEngine(#[from] LlmError),

    #[error("no final answer after {rounds} tool rounds")]
    LoopBoundExceeded { rounds: usize },

    #[error("turn was cancelled")]
    Cancelled,

    #[error("conversation invariant violated: {0}")]
    Conversation(#[from] ConversationError),
}
