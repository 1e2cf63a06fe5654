//! Core agent loop implementation.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::conversation::{Conversation, ToolCall};
use crate::llm::{CompletionRequest, LlmClient, ModelTurn, OpenAiClient};
use crate::tools::{RemoteBrowser, ToolError, ToolRegistry};

use super::prompt::build_system_prompt;
use super::AgentError;

/// Default bound on tool rounds per turn.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Per-agent model settings.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    /// Tool rounds allowed before a turn fails with `LoopBoundExceeded`.
    pub max_rounds: usize,
    /// Fixed system prompt. When `None`, one is built from the tool list each turn.
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            max_rounds: DEFAULT_MAX_ROUNDS,
            system_prompt: None,
        }
    }
}

/// Where the loop is within a turn.
enum LoopState {
    AwaitingModel,
    AwaitingTools(Vec<ToolCall>),
    Done(String),
}

/// The conversational agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, settings: AgentSettings) -> Self {
        Self {
            llm,
            tools,
            settings,
        }
    }

    /// Wire up the OpenAI client and the hosted browser tools from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let llm = OpenAiClient::new(
            config.openai_api_key.clone(),
            &config.openai_base_url,
            config.llm_timeout,
        )?;
        let browser = RemoteBrowser::new(
            &config.browser_base_url,
            config.browser_api_key.clone(),
            config.tool_timeout,
        )?;
        let tools = ToolRegistry::with_default_tools(Arc::new(browser), config.tool_timeout)?;

        tracing::info!(
            "Registered {} tools: {}",
            tools.len(),
            tools
                .list()
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self::new(
            Arc::new(llm),
            Arc::new(tools),
            AgentSettings {
                model: config.default_model.clone(),
                temperature: config.temperature,
                max_rounds: config.max_rounds,
                system_prompt: None,
            },
        ))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Run one turn: append the user message and loop until a final answer.
    pub async fn submit(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
    ) -> Result<String, AgentError> {
        self.submit_with_cancel(conversation, user_text, &CancellationToken::new())
            .await
    }

    /// Like [`Agent::submit`], stopping early once `cancel` fires.
    ///
    /// Whatever happens, every tool call in the conversation ends up with a result,
    /// so the conversation stays usable for the next turn.
    pub async fn submit_with_cancel(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        conversation.push_user(user_text);

        let system_prompt = match &self.settings.system_prompt {
            Some(prompt) => prompt.clone(),
            None => build_system_prompt(self.tools.list(), chrono::Local::now().date_naive()),
        };

        let mut state = LoopState::AwaitingModel;
        let mut rounds = 0;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    tracing::debug!("Agent round {}", rounds + 1);

                    let request = CompletionRequest {
                        model: &self.settings.model,
                        temperature: self.settings.temperature,
                        system_prompt: Some(&system_prompt),
                        messages: conversation.messages(),
                        tools: self.tools.list(),
                    };

                    let turn = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                        turn = self.llm.chat_completion(request) => turn?,
                    };

                    match turn {
                        ModelTurn::Final(text) => {
                            conversation.push_assistant(text.clone());
                            LoopState::Done(text)
                        }
                        ModelTurn::ToolCalls { content, calls } => {
                            conversation.push_tool_calls(content, calls.clone())?;
                            LoopState::AwaitingTools(calls)
                        }
                    }
                }
                LoopState::AwaitingTools(calls) => {
                    let results = self.run_tool_batch(&calls, cancel).await;

                    for (call, result) in calls.iter().zip(results) {
                        match result {
                            Ok(content) => conversation.push_tool_result(call, content, false)?,
                            Err(e) => conversation.push_tool_result(
                                call,
                                format!("Error: {}", e),
                                true,
                            )?,
                        }
                    }

                    rounds += 1;
                    if cancel.is_cancelled() {
                        return Err(AgentError::Cancelled);
                    }
                    if rounds >= self.settings.max_rounds {
                        tracing::warn!("Turn hit the round bound ({} rounds)", rounds);
                        return Err(AgentError::LoopBoundExceeded { rounds });
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => return Ok(text),
            };
        }
    }

    /// Run a batch of tool calls concurrently; results come back in call order.
    async fn run_tool_batch(
        &self,
        calls: &[ToolCall],
        cancel: &CancellationToken,
    ) -> Vec<Result<String, ToolError>> {
        let futures = calls.iter().map(|call| async move {
            tracing::info!(tool_call_id = %call.id, tool = %call.name, "Calling tool");
            tracing::debug!(tool_call_id = %call.id, "Tool args: {}", call.arguments);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ToolError::Cancelled(call.name.clone())),
                res = self.tools.invoke(&call.name, call.arguments.clone()) => res,
            };

            match &result {
                Ok(_) => tracing::debug!(tool_call_id = %call.id, tool = %call.name, "Tool succeeded"),
                Err(e) => tracing::warn!(
                    tool_call_id = %call.id,
                    tool = %call.name,
                    kind = ?e.kind(),
                    "Tool failed: {}",
                    e
                ),
            }

            result.map(|output| output.into_content())
        });

        join_all(futures).await
    }
}
