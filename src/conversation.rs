//! Conversation state: the ordered, role-tagged transcript of a chat session.
//!
//! The transcript is the only memory a session has. It is append-only while a turn
//! runs, and every tool-result message must answer a tool call that an earlier
//! assistant message issued.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("tool result references unknown tool call id: {0}")]
    UnknownToolCall(String),

    #[error("tool call {0} already has a result")]
    DuplicateToolResult(String),

    #[error("duplicate tool call id in one assistant message: {0}")]
    DuplicateToolCall(String),
}

/// A single tool invocation requested by the reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier issued by the engine, echoed back in the tool result.
    pub id: String,
    /// Name of the registered tool.
    pub name: String,
    /// Raw arguments; validated against the tool schema before execution.
    pub arguments: Value,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::User { content } | Message::Tool { content, .. } => Some(content),
            Message::Assistant { content, .. } => content.as_deref(),
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// Append-only transcript for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a conversation from stored messages, re-checking tool call references.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, ConversationError> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn push_tool_calls(
        &mut self,
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Result<(), ConversationError> {
        self.push(Message::Assistant {
            content,
            tool_calls,
        })
    }

    pub fn push_tool_result(
        &mut self,
        call: &ToolCall,
        content: impl Into<String>,
        is_error: bool,
    ) -> Result<(), ConversationError> {
        self.push(Message::Tool {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
            is_error,
        })
    }

    /// Tool calls issued by the most recent assistant message that have no result yet.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(start) = self.last_assistant() else {
            return Vec::new();
        };
        self.messages[start]
            .tool_calls()
            .iter()
            .filter(|call| !self.answered_since(start, &call.id))
            .collect()
    }

    /// Append a message after checking the tool call id invariant.
    ///
    /// Call ids are only unique within one assistant message; engines may reuse them
    /// in later steps. A tool result answers a call from the most recent assistant
    /// message.
    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        match &message {
            Message::Assistant { tool_calls, .. } => {
                for (i, call) in tool_calls.iter().enumerate() {
                    if tool_calls[..i].iter().any(|c| c.id == call.id) {
                        return Err(ConversationError::DuplicateToolCall(call.id.clone()));
                    }
                }
            }
            Message::Tool { tool_call_id, .. } => {
                let Some(start) = self.last_assistant().filter(|&start| {
                    self.messages[start]
                        .tool_calls()
                        .iter()
                        .any(|call| &call.id == tool_call_id)
                }) else {
                    return Err(ConversationError::UnknownToolCall(tool_call_id.clone()));
                };
                if self.answered_since(start, tool_call_id) {
                    return Err(ConversationError::DuplicateToolResult(
                        tool_call_id.clone(),
                    ));
                }
            }
            Message::User { .. } => {}
        }
        self.messages.push(message);
        Ok(())
    }

    fn last_assistant(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| matches!(m, Message::Assistant { .. }))
    }

    fn answered_since(&self, start: usize, id: &str) -> bool {
        self.messages[start + 1..].iter().any(
            |m| matches!(m, Message::Tool { tool_call_id, .. } if tool_call_id == id),
        )
    }
}

impl TryFrom<Vec<Message>> for Conversation {
    type Error = ConversationError;

    fn try_from(messages: Vec<Message>) -> Result<Self, Self::Error> {
        Self::from_messages(messages)
    }
}

impl From<Conversation> for Vec<Message> {
    fn from(conversation: Conversation) -> Self {
        conversation.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "get_all_hackernews_posts".to_string(),
            arguments: json!({}),
        }
    }

    #[test]
    fn tool_result_requires_prior_call() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        let err = conversation
            .push_tool_result(&call("call_1"), "nope", false)
            .unwrap_err();
        assert_eq!(err, ConversationError::UnknownToolCall("call_1".into()));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn tool_result_cannot_be_recorded_twice() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        conversation
            .push_tool_calls(None, vec![call("call_1")])
            .unwrap();
        conversation
            .push_tool_result(&call("call_1"), "ok", false)
            .unwrap();
        let err = conversation
            .push_tool_result(&call("call_1"), "again", false)
            .unwrap_err();
        assert_eq!(err, ConversationError::DuplicateToolResult("call_1".into()));
    }

    #[test]
    fn duplicate_call_ids_are_rejected() {
        let mut conversation = Conversation::new();
        let err = conversation
            .push_tool_calls(None, vec![call("a"), call("a")])
            .unwrap_err();
        assert_eq!(err, ConversationError::DuplicateToolCall("a".into()));
    }

    #[test]
    fn call_ids_may_repeat_across_steps() {
        let mut conversation = Conversation::new();
        conversation.push_user("first");
        conversation.push_tool_calls(None, vec![call("call_0")]).unwrap();
        conversation.push_tool_result(&call("call_0"), "ok", false).unwrap();
        conversation.push_assistant("done");

        conversation.push_user("second");
        conversation.push_tool_calls(None, vec![call("call_0")]).unwrap();
        assert_eq!(conversation.pending_tool_calls().len(), 1);
        conversation.push_tool_result(&call("call_0"), "ok again", false).unwrap();
        assert!(conversation.pending_tool_calls().is_empty());

        let err = conversation
            .push_tool_result(&call("call_0"), "third", false)
            .unwrap_err();
        assert_eq!(err, ConversationError::DuplicateToolResult("call_0".into()));

        let restored = Conversation::from_messages(conversation.messages().to_vec()).unwrap();
        assert_eq!(restored, conversation);
    }

    #[test]
    fn results_only_answer_the_latest_assistant_message() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        conversation.push_tool_calls(None, vec![call("a")]).unwrap();
        conversation.push_tool_result(&call("a"), "ok", false).unwrap();
        conversation.push_tool_calls(None, vec![call("b")]).unwrap();
        let err = conversation
            .push_tool_result(&call("a"), "late", false)
            .unwrap_err();
        assert_eq!(err, ConversationError::UnknownToolCall("a".into()));
    }

    #[test]
    fn pending_calls_shrink_as_results_arrive() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        conversation
            .push_tool_calls(None, vec![call("a"), call("b")])
            .unwrap();
        assert_eq!(conversation.pending_tool_calls().len(), 2);
        conversation.push_tool_result(&call("a"), "ok", false).unwrap();
        let pending = conversation.pending_tool_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "b");
    }

    #[test]
    fn serializes_as_tagged_message_array() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi");
        conversation.push_tool_calls(None, vec![call("a")]).unwrap();
        conversation.push_tool_result(&call("a"), "ok", false).unwrap();
        conversation.push_assistant("done");

        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(value[0], json!({"role": "user", "content": "hi"}));
        assert_eq!(value[2]["role"], "tool");
        assert_eq!(value[2]["tool_call_id"], "a");
        assert_eq!(value[3], json!({"role": "assistant", "content": "done"}));

        let restored: Conversation = serde_json::from_value(value).unwrap();
        assert_eq!(restored, conversation);
    }

    #[test]
    fn deserializing_rejects_orphan_tool_results() {
        let value = json!([
            {"role": "user", "content": "hi"},
            {"role": "tool", "tool_call_id": "ghost", "name": "x", "content": "?"}
        ]);
        assert!(serde_json::from_value::<Conversation>(value).is_err());
    }
}
