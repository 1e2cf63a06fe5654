//! Hacker News front page tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::browser::{extracted_text, with_session, BrowserProvider};
use super::{parse_args, parse_web_url, Tool, ToolOutput};

const FRONT_PAGE: &str = "https://news.ycombinator.com/";

/// List today's top Hacker News posts.
pub struct GetAllHackerNewsPosts {
    browser: Arc<dyn BrowserProvider>,
}

impl GetAllHackerNewsPosts {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for GetAllHackerNewsPosts {
    fn name(&self) -> &str {
        "get_all_hackernews_posts"
    }

    fn description(&self) -> &str {
        "Get all the top posts from Hacker News from today."
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
            page.goto(FRONT_PAGE).await?;
            page.wait_for("The front page is loaded").await?;
            page.extract(
                "Get all top posts from Hacker News as a string containing title, url, points, and number of comments",
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

/// Open a Hacker News post (or the page it links to) and summarise its text.
pub struct ReadMoreHackerNews {
    browser: Arc<dyn BrowserProvider>,
}

impl ReadMoreHackerNews {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for ReadMoreHackerNews {
    fn name(&self) -> &str {
        "read_more_hackernews"
    }

    fn description(&self) -> &str {
        "If you want to learn more about a Hacker News post, call this function to go to its url and summarize the contents."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the post or article"
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
                "Get the informational text of the article/post/website, return as a string",
                None,
            )
            .await
        })
        .await?;

        Ok(ToolOutput::Text(extracted_text(info)))
    }
}
