//! In-memory chat sessions (non-persistent).
//!
//! A session owns its conversation. Turns run one at a time per session on a
//! spawned task, so a dropped HTTP request never leaves a half-written transcript.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agent::{Agent, AgentError};
use crate::conversation::{Conversation, Message};

use super::types::SessionState;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a turn is already running for this session")]
    Busy,

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("turn task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    conversation: Arc<Mutex<Conversation>>,
    /// Transcript as of the end of the last turn.
    settled: Arc<RwLock<Vec<Message>>>,
    working: Arc<AtomicBool>,
    cancel: CancellationToken,
}

/// Clears the working flag when the turn ends, however it ends.
struct WorkingGuard(Arc<AtomicBool>);

impl Drop for WorkingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ChatSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            conversation: Arc::new(Mutex::new(Conversation::new())),
            settled: Arc::new(RwLock::new(Vec::new())),
            working: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn is_working(&self) -> bool {
        self.working.load(Ordering::SeqCst)
    }

    /// Run one turn to completion. Fails with `Busy` if a turn is already running.
    pub async fn submit(&self, agent: Arc<Agent>, text: String) -> Result<String, SubmitError> {
        let mut conversation = self
            .conversation
            .clone()
            .try_lock_owned()
            .map_err(|_| SubmitError::Busy)?;

        self.working.store(true, Ordering::SeqCst);
        let working = WorkingGuard(self.working.clone());
        let cancel = self.cancel.clone();
        let settled = self.settled.clone();
        let session_id = self.id;

        let handle = tokio::spawn(async move {
            let _working = working;
            let result = agent
                .submit_with_cancel(&mut conversation, &text, &cancel)
                .await;
            if let Err(e) = &result {
                tracing::warn!(session_id = %session_id, "Turn failed: {}", e);
            }
            *settled.write().await = conversation.messages().to_vec();
            result
        });

        Ok(handle.await??)
    }

    /// Snapshot of the session. While a turn runs, the transcript is the one from
    /// before the turn started.
    pub async fn snapshot(&self) -> SessionState {
        SessionState {
            id: self.id,
            created_at: self.created_at,
            working: self.is_working(),
            messages: self.settled.read().await.clone(),
        }
    }

    fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<ChatSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Arc<ChatSession> {
        let session = Arc::new(ChatSession::new());
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, "Created chat session");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<ChatSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drop a session, cancelling any turn in flight.
    pub async fn remove(&self, id: Uuid) -> bool {
        match self.sessions.write().await.remove(&id) {
            Some(session) => {
                session.cancel();
                tracing::info!(session_id = %id, "Removed chat session");
                true
            }
            None => false,
        }
    }
}
