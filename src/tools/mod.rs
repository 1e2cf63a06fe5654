//! Tool registry and the browser-backed tools the agent can call.
//!
//! Every tool is a thin script against the hosted browser automation service:
//! open a page, click or fill what a human would, then ask the service to extract
//! the data. The registry is built once at startup and never changes afterwards.

pub mod browser;
mod email;
mod hackernews;
mod openai_status;
mod producthunt;
pub mod schema;
mod trademarks;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use browser::{BrowserError, BrowserProvider, BrowserSession, RemoteBrowser};
pub use email::SendEmail;
pub use hackernews::{GetAllHackerNewsPosts, ReadMoreHackerNews};
pub use openai_status::{ApiStatus, GetOpenAiApiStatus, NewsItem, ServiceStatus};
pub use producthunt::{GetAllProductHuntPosts, ReadMoreProductHunt};
pub use trademarks::SearchTrademarks;

/// Failure category as seen by the reasoning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// The call itself was malformed; the model can retry with corrected arguments.
    ToolArgumentError,
    /// The handler ran (or was stopped) and failed.
    ToolExecutionError,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{tool} failed: {source:#}")]
    Execution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("{0} was cancelled")]
    Cancelled(String),
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. } => {
                ToolErrorKind::ToolArgumentError
            }
            ToolError::Execution { .. } | ToolError::Timeout { .. } | ToolError::Cancelled(_) => {
                ToolErrorKind::ToolExecutionError
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool registered twice: {0}")]
    DuplicateTool(String),

    #[error("tool {tool} has an invalid parameter schema: {reason}")]
    InvalidSchema { tool: String, reason: String },
}

/// What a tool hands back to the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    /// Render the output as message content.
    pub fn into_content(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Public description of a tool, as offered to the reasoning engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Trait for a callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Description the model reads to decide when to call the tool.
    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Arguments have already been checked against the schema.
    async fn execute(&self, args: Value) -> anyhow::Result<ToolOutput>;
}

/// Decode validated arguments into a tool's typed argument struct.
///
/// Failures surface as [`ToolError::InvalidArguments`] so the registry reports
/// them as argument errors rather than execution failures.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> anyhow::Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| {
        ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Reject anything that is not an absolute http(s) URL.
pub fn parse_web_url(tool: &str, raw: &str) -> anyhow::Result<url::Url> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };
    let url = url::Url::parse(raw).map_err(|e| invalid(format!("invalid url '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("url must be http or https, got '{}'", raw)).into());
    }
    Ok(url)
}

/// Registry of available tools, in registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    specs: Vec<ToolSpec>,
    by_name: HashMap<String, usize>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registry with every browser-backed tool, all sharing one automation provider.
    pub fn with_default_tools(
        browser: Arc<dyn BrowserProvider>,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        Self::builder()
            .timeout(timeout)
            .register(GetAllProductHuntPosts::new(browser.clone()))
            .register(GetAllHackerNewsPosts::new(browser.clone()))
            .register(ReadMoreHackerNews::new(browser.clone()))
            .register(ReadMoreProductHunt::new(browser.clone()))
            .register(SendEmail::new(browser.clone()))
            .register(GetOpenAiApiStatus::new(browser.clone()))
            .register(SearchTrademarks::new(browser))
            .build()
    }

    /// Specs of all tools, in registration order.
    pub fn list(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate the arguments and run the named tool under the registry timeout.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let tool = &self.tools[index];

        schema::validate_arguments(&self.specs[index].parameters, &args).map_err(|reason| {
            ToolError::InvalidArguments {
                tool: name.to_string(),
                reason,
            }
        })?;

        match tokio::time::timeout(self.timeout, tool.execute(args)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(match e.downcast::<ToolError>() {
                Ok(tool_error) => tool_error,
                Err(source) => ToolError::Execution {
                    tool: name.to_string(),
                    source,
                },
            }),
            Err(_) => Err(ToolError::Timeout {
                tool: name.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
    timeout: Duration,
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ToolRegistryBuilder {
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Per-call timeout applied by [`ToolRegistry::invoke`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Freeze the registry, rejecting duplicate names and unusable schemas.
    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        let mut by_name = HashMap::with_capacity(self.tools.len());
        let mut specs = Vec::with_capacity(self.tools.len());

        for (index, tool) in self.tools.iter().enumerate() {
            let name = tool.name().to_string();
            let parameters = tool.parameters_schema();
            schema::check_schema(&parameters).map_err(|reason| RegistryError::InvalidSchema {
                tool: name.clone(),
                reason,
            })?;
            if by_name.insert(name.clone(), index).is_some() {
                return Err(RegistryError::DuplicateTool(name));
            }
            specs.push(ToolSpec {
                name,
                description: tool.description().to_string(),
                parameters,
            });
        }

        Ok(ToolRegistry {
            tools: self.tools,
            specs,
            by_name,
            timeout: self.timeout,
        })
    }
}
