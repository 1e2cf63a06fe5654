//! OpenAI service status, extracted as structured data.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::browser::{with_session, BrowserError, BrowserProvider};
use super::{Tool, ToolOutput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// The name of the service.
    pub name: String,
    /// e.g. "operational" or "partial outage".
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// The content of the news or incident update.
    pub news: String,
    /// YYYY-MM-DD.
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub services_status: Vec<ServiceStatus>,
    pub news: Vec<NewsItem>,
}

impl ApiStatus {
    /// Schema handed to the extractor so it returns exactly this shape.
    pub fn extraction_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "services_status": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string", "description": "The name of the service."},
                            "status": {"type": "string", "description": "e.g 'operational' or 'partial outage'."}
                        },
                        "required": ["name", "status"]
                    }
                },
                "news": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "news": {"type": "string", "description": "The content of the news or incident update."},
                            "date": {"type": ["string", "null"], "description": "YYYY-MM-DD format."}
                        },
                        "required": ["news"]
                    }
                }
            },
            "required": ["services_status", "news"]
        })
    }
}

pub struct GetOpenAiApiStatus {
    browser: Arc<dyn BrowserProvider>,
}

impl GetOpenAiApiStatus {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for GetOpenAiApiStatus {
    fn name(&self) -> &str {
        "get_openai_api_status"
    }

    fn description(&self) -> &str {
        "Get the current status of OpenAI's services."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<ToolOutput> {
        let schema = ApiStatus::extraction_schema();
        let status = with_session(self.browser.as_ref(), None, |page| async move {
            page.goto("https://status.openai.com/").await?;
            let raw = page
                .extract("Get the current status of this service.", Some(&schema))
                .await?;
            serde_json::from_value::<ApiStatus>(raw)
                .map_err(|e| BrowserError::Decode(format!("status page extraction: {}", e)))
        })
        .await?;

        Ok(ToolOutput::Json(serde_json::to_value(status)?))
    }
}
