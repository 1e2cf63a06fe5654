//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::Message;

/// Response after creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Unique session identifier
    pub id: Uuid,
}

/// Request to submit a user message.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitMessageRequest {
    /// The user's utterance
    pub message: String,
}

/// Final assistant answer for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMessageResponse {
    pub reply: String,
}

/// Full session state including the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,

    pub created_at: DateTime<Utc>,

    /// True while a turn is running; the UI shows a "working" indicator.
    pub working: bool,

    pub messages: Vec<Message>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
