//! Reasoning engine boundary.
//!
//! The agent loop only sees [`LlmClient`]: give it the transcript and the tool
//! list, get back either a final answer or a batch of tool calls.

mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::{Message, ToolCall};
use crate::tools::ToolSpec;

pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to reasoning engine failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("reasoning engine returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("could not decode reasoning engine response: {0}")]
    Decode(String),

    #[error("reasoning engine returned neither text nor tool calls")]
    EmptyResponse,
}

/// Everything the engine needs for one decision.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub temperature: f32,
    /// Instructions prepended to the transcript; not part of the conversation.
    pub system_prompt: Option<&'a str>,
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
}

/// The engine's decision for one step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// A final natural-language answer.
    Final(String),
    /// One or more tool calls, optionally with interim text.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

/// A language model that can choose tools.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(&self, request: CompletionRequest<'_>) -> Result<ModelTurn, LlmError>;
}
