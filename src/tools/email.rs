//! Send an email through an authenticated Outlook web session.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::browser::{with_session, BrowserProvider};
use super::{parse_args, Tool, ToolError, ToolOutput};

/// Stored login the automation service uses for the mailbox.
const MAIL_AUTH: &str = "outlook.live.com";
const MAIL_URL: &str = "https://outlook.live.com/mail/0/";

#[derive(Debug, Deserialize)]
struct SendEmailArgs {
    email_address: String,
    subject: String,
    body: String,
}

pub struct SendEmail {
    browser: Arc<dyn BrowserProvider>,
}

impl SendEmail {
    pub fn new(browser: Arc<dyn BrowserProvider>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for SendEmail {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Sends an email to the provided email address with the provided subject and body. Don't use markdown in the body."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email_address": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line"
                },
                "body": {
                    "type": "string",
                    "description": "Plain-text body"
                }
            },
            "required": ["email_address", "subject", "body"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolOutput> {
        let args: SendEmailArgs = parse_args(self.name(), args)?;
        let address = args.email_address.trim();
        if !is_plausible_address(address) {
            return Err(ToolError::InvalidArguments {
                tool: self.name().to_string(),
                reason: format!("'{}' is not an email address", address),
            }
            .into());
        }

        let fields = BTreeMap::from([
            ("to_field".to_string(), address.to_string()),
            ("subject_field".to_string(), args.subject),
            ("body_field".to_string(), args.body),
        ]);

        tracing::debug!(to = %address, "Sending email");

        with_session(self.browser.as_ref(), Some(MAIL_AUTH), |mail| async move {
            mail.goto(MAIL_URL).await?;
            mail.click("the new email button").await?;
            mail.fill_fields(&fields).await?;
            mail.click("the send email button").await
        })
        .await?;

        Ok(ToolOutput::Text(format!("Email sent to {}", address)))
    }
}

fn is_plausible_address(address: &str) -> bool {
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !address.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::browser::fake::FakeBrowser;

    #[tokio::test]
    async fn sends_through_authenticated_mailbox() {
        let browser = Arc::new(FakeBrowser::default());
        let tool = SendEmail::new(browser.clone());

        let output = tool
            .execute(json!({
                "email_address": "team@example.com",
                "subject": "Daily digest",
                "body": "Three new launches today."
            }))
            .await
            .unwrap();

        assert_eq!(
            output,
            ToolOutput::Text("Email sent to team@example.com".into())
        );
        assert_eq!(
            browser.actions(),
            vec![
                "open:outlook.live.com",
                "goto:https://outlook.live.com/mail/0/",
                "click:the new email button",
                "fill_fields:body_field=Three new launches today.,subject_field=Daily digest,to_field=team@example.com",
                "click:the send email button",
                "close:",
            ]
        );
    }

    #[tokio::test]
    async fn rejects_malformed_address() {
        let browser = Arc::new(FakeBrowser::default());
        let tool = SendEmail::new(browser.clone());

        let err = tool
            .execute(json!({"email_address": "not-an-address", "subject": "s", "body": "b"}))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::InvalidArguments { .. })
        ));
        assert!(browser.actions().is_empty());
    }

    #[test]
    fn address_plausibility() {
        assert!(is_plausible_address("a@b.co"));
        assert!(!is_plausible_address("@b.co"));
        assert!(!is_plausible_address("a@localhost"));
        assert!(!is_plausible_address("a b@c.d"));
        assert!(!is_plausible_address("a@b@c.d"));
    }
}
