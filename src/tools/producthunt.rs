//! Product Hunt tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::browser::{extracted_text, with_session, BrowserProvider};
use super::{parse_args, parse_web_url, Tool, ToolOutput};

/// List today's Product Hunt launches.
pub struct GetAllProductHuntPosts {
    browser: Arc<dyn BrowserProvider>,
}

impl GetAllProductHuntPosts {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for GetAllProductHuntPosts {
    fn name(&self) -> &str {
        "get_all_product_hunt_posts"
    }

    fn description(&self) -> &str {
        "Get all the posts from Product Hunt from today."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<ToolOutput> {
        let posts = with_session(self.browser.as_ref(), None, |page| async move {
            page.goto("https://www.producthunt.com/").await?;
            page.click("the see all of today's posts button").await?;
            page.extract(
                "Get all today's posts from product hunt as a string containing name, desc, categories, upvotes and url",
                None,
            )
            .await
        })
        .await?;

        Ok(ToolOutput::Text(extracted_text(posts)))
    }
}

#[derive(Deserialize)]
struct ReadMoreArgs {
    url: String,
}

/// Read the description and discussion of a single product.
pub struct ReadMoreProductHunt {
    browser: Arc<dyn BrowserProvider>,
}

impl ReadMoreProductHunt {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for ReadMoreProductHunt {
    fn name(&self) -> &str {
        "read_more_product_hunt"
    }

    fn description(&self) -> &str {
        "If you want to learn more about a Product Hunt product, call this function with the product's url."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The Product Hunt URL of the product"
                }
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let args: ReadMoreArgs = parse_args(self.name(), args)?;
        let url = parse_web_url(self.name(), &args.url)?;

        let info = with_session(self.browser.as_ref(), None, |page| async move {
            page.goto(url.as_str()).await?;
            page.extract(
                "Get all the description text about this product and the discussion and return as a string",
                None,
            )
            .await
        })
        .await?;

        Ok(ToolOutput::Text(extracted_text(info)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::browser::fake::FakeBrowser;

    #[tokio::test]
    async fn todays_posts_opens_full_list_first() {
        let browser = Arc::new(FakeBrowser::with_extractions(vec![json!("Widget - 300 upvotes")]));
        let tool = GetAllProductHuntPosts::new(browser.clone());

        let output = tool.execute(Value::Null).await.unwrap();

        assert_eq!(output.into_content(), "Widget - 300 upvotes");
        let actions = browser.actions();
        assert_eq!(
            &actions[..3],
            &[
                "open:-".to_string(),
                "goto:https://www.producthunt.com/".to_string(),
                "click:the see all of today's posts button".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn read_more_visits_the_product_page() {
        let browser = Arc::new(FakeBrowser::with_extractions(vec![json!("A widget for widgets")]));
        let tool = ReadMoreProductHunt::new(browser.clone());

        let output = tool
            .execute(json!({"url": "https://www.producthunt.com/posts/widget"}))
            .await
            .unwrap();

        assert_eq!(output, ToolOutput::Text("A widget for widgets".into()));
        assert_eq!(
            browser.actions()[1],
            "goto:https://www.producthunt.com/posts/widget"
        );
    }

    #[tokio::test]
    async fn browser_failures_still_close_the_session() {
        let browser = Arc::new(FakeBrowser {
            fail_on: Some("click"),
            ..FakeBrowser::default()
        });
        let tool = GetAllProductHuntPosts::new(browser.clone());

        let err = tool.execute(Value::Null).await.unwrap_err();

        assert!(err.to_string().contains("scripted failure"), "{err}");
        assert_eq!(browser.actions().last().map(String::as_str), Some("close:"));
    }
}
