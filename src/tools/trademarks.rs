//! USPTO trademark search.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::browser::{extracted_text, with_session, BrowserProvider};
use super::{parse_args, Tool, ToolError, ToolOutput};

const SEARCH_PAGE: &str = "https://tmsearch.uspto.gov/search/search-information";

#[derive(Deserialize)]
struct SearchArgs {
    trademark_search_name: String,
}

pub struct SearchTrademarks {
    browser: Arc<dyn BrowserProvider>,
}

impl SearchTrademarks {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for SearchTrademarks {
    fn name(&self) -> &str {
        "search_trademarks"
    }

    fn description(&self) -> &str {
        "Does a trademark search for the provided trademark name and returns the active trademarks so that you can determine if there are any conflicting trademarks."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "trademark_search_name": {
                    "type": "string",
                    "description": "The trademark name to search for"
                }
            },
            "required": ["trademark_search_name"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let args: SearchArgs = parse_args(self.name(), args)?;
        let name = args.trademark_search_name.trim().to_string();
        if name.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: self.name().to_string(),
                reason: "trademark_search_name must not be empty".to_string(),
            }
            .into());
        }

        let trademarks = with_session(self.browser.as_ref(), None, |page| async move {
            page.goto(SEARCH_PAGE).await?;
            page.fill("the trademark name search bar", &name).await?;
            page.press("Enter").await?;
            page.click("the 'dead' toggle to remove expired trademarks")
                .await?;
            page.wait_for("all the trademarks to load").await?;
            page.extract(
                "Get all the trademarks in the search results as a list of strings where each string contains the status and description of the trademark",
                None,
            )
            .await
        })
        .await?;

        tracing::debug!("Trademark search returned {} bytes", trademarks.to_string().len());

        Ok(ToolOutput::Text(extracted_text(trademarks)))
    }
}
