//! Hosted browser automation client.
//!
//! Tools never drive a browser themselves: they open a session on a remote
//! automation service, issue natural-language actions (`click("the send button")`)
//! and ask it to extract data. Each tool owns its session and releases it when done.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("browser service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("browser action '{action}' failed: {reason}")]
    Action { action: String, reason: String },

    #[error("unexpected browser service response: {0}")]
    Decode(String),
}

/// A live session on the automation service.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Click the element best matching a natural-language description.
    async fn click(&self, prompt: &str) -> Result<(), BrowserError>;

    async fn fill(&self, prompt: &str, value: &str) -> Result<(), BrowserError>;

    /// Fill several fields at once, keyed by field description.
    async fn fill_fields(&self, fields: &BTreeMap<String, String>) -> Result<(), BrowserError>;

    async fn press(&self, key: &str) -> Result<(), BrowserError>;

    /// Block until the page satisfies a natural-language condition.
    async fn wait_for(&self, prompt: &str) -> Result<(), BrowserError>;

    /// Extract data from the current page, optionally shaped by a JSON schema.
    async fn extract(&self, prompt: &str, schema: Option<&Value>) -> Result<Value, BrowserError>;

    async fn close(&self) -> Result<(), BrowserError>;
}

/// Opens sessions on the automation service.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    /// Open a new session. `auth` names a stored login (e.g. `outlook.live.com`).
    async fn open(&self, auth: Option<&str>) -> Result<Arc<dyn BrowserSession>, BrowserError>;
}

/// Closes the session if the owning future is dropped before it finishes.
struct SessionGuard {
    session: Option<Arc<dyn BrowserSession>>,
}

impl SessionGuard {
    async fn close(mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!("Failed to close browser session: {}", e);
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = session.close().await {
                    tracing::warn!("Failed to close abandoned browser session: {}", e);
                }
            });
        }
    }
}

/// Run `f` against a fresh session and close it afterwards, whatever the outcome.
pub async fn with_session<T, F, Fut>(
    provider: &dyn BrowserProvider,
    auth: Option<&str>,
    f: F,
) -> Result<T, BrowserError>
where
    F: FnOnce(Arc<dyn BrowserSession>) -> Fut,
    Fut: Future<Output = Result<T, BrowserError>>,
{
    let session = provider.open(auth).await?;
    let guard = SessionGuard {
        session: Some(session.clone()),
    };
    let result = f(session).await;
    guard.close().await;
    result
}

/// Render an extraction result as plain text for the model.
pub fn extracted_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote service client
// ─────────────────────────────────────────────────────────────────────────────

/// Actions understood by the automation service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowserAction<'a> {
    Goto {
        url: &'a str,
    },
    Click {
        prompt: &'a str,
    },
    Fill {
        prompt: &'a str,
        value: &'a str,
    },
    FillFields {
        fields: &'a BTreeMap<String, String>,
    },
    Press {
        key: &'a str,
    },
    WaitFor {
        prompt: &'a str,
    },
    Extract {
        prompt: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<&'a Value>,
    },
}

impl BrowserAction<'_> {
    fn name(&self) -> &'static str {
        match self {
            BrowserAction::Goto { .. } => "goto",
            BrowserAction::Click { .. } => "click",
            BrowserAction::Fill { .. } => "fill",
            BrowserAction::FillFields { .. } => "fill_fields",
            BrowserAction::Press { .. } => "press",
            BrowserAction::WaitFor { .. } => "wait_for",
            BrowserAction::Extract { .. } => "extract",
        }
    }
}

#[derive(Serialize)]
struct OpenSessionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
}

#[derive(Deserialize)]
struct OpenSessionResponse {
    session_id: String,
}

#[derive(Deserialize)]
struct ActionResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Automation service reached over JSON/HTTP.
#[derive(Clone)]
pub struct RemoteBrowser {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteBrowser {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("competition-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl BrowserProvider for RemoteBrowser {
    async fn open(&self, auth: Option<&str>) -> Result<Arc<dyn BrowserSession>, BrowserError> {
        let response = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&OpenSessionRequest { auth })
            .send()
            .await?;
        let opened: OpenSessionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BrowserError::Decode(e.to_string()))?;

        tracing::debug!(session_id = %opened.session_id, auth = ?auth, "Opened browser session");

        Ok(Arc::new(RemoteSession {
            client: self.client.clone(),
            session_url: format!("{}/sessions/{}", self.base_url, opened.session_id),
            api_key: self.api_key.clone(),
        }))
    }
}

struct RemoteSession {
    client: reqwest::Client,
    session_url: String,
    api_key: String,
}

impl RemoteSession {
    async fn act(&self, action: BrowserAction<'_>) -> Result<Value, BrowserError> {
        let response = self
            .client
            .post(format!("{}/actions", self.session_url))
            .bearer_auth(&self.api_key)
            .json(&action)
            .send()
            .await?;
        let body: ActionResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BrowserError::Decode(e.to_string()))?;

        match body.error {
            Some(reason) => Err(BrowserError::Action {
                action: action.name().to_string(),
                reason,
            }),
            None => Ok(body.result),
        }
    }
}

#[async_trait]
impl BrowserSession for RemoteSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.act(BrowserAction::Goto { url }).await.map(drop)
    }

    async fn click(&self, prompt: &str) -> Result<(), BrowserError> {
        self.act(BrowserAction::Click { prompt }).await.map(drop)
    }

    async fn fill(&self, prompt: &str, value: &str) -> Result<(), BrowserError> {
        self.act(BrowserAction::Fill { prompt, value }).await.map(drop)
    }

    async fn fill_fields(&self, fields: &BTreeMap<String, String>) -> Result<(), BrowserError> {
        self.act(BrowserAction::FillFields { fields }).await.map(drop)
    }

    async fn press(&self, key: &str) -> Result<(), BrowserError> {
        self.act(BrowserAction::Press { key }).await.map(drop)
    }

    async fn wait_for(&self, prompt: &str) -> Result<(), BrowserError> {
        self.act(BrowserAction::WaitFor { prompt }).await.map(drop)
    }

    async fn extract(&self, prompt: &str, schema: Option<&Value>) -> Result<Value, BrowserError> {
        self.act(BrowserAction::Extract { prompt, schema }).await
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let response = self
            .client
            .delete(&self.session_url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BrowserError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(BrowserError::Http {
        status: status.as_u16(),
        body,
    })
}
