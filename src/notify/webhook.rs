//! DingTalk-compatible robot webhook notifier.

use super::alert::Alert;
use super::{NotifyError, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// `{"msgtype": "text", "text": {"content": ...}}`
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    text: TextContent<'a>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

/// Robot acknowledgement. DingTalk answers 200 even when it drops a message.
#[derive(Debug, Deserialize)]
struct RobotReply {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Posts text alerts to a chat robot webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: Client,
    url: String,
    title: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, title: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            url: url.into(),
            title: title.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, alert))]
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        let content = alert.render(&self.title);
        let message = TextMessage {
            msgtype: "text",
            text: TextContent { content: &content },
        };

        let response = self
            .http
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Plain-text or empty replies come from generic webhooks; accept them
        if let Ok(reply) = serde_json::from_str::<RobotReply>(&body) {
            if reply.errcode != 0 {
                return Err(NotifyError::Rejected {
                    code: reply.errcode,
                    message: reply.errmsg,
                });
            }
        }

        debug!(symbols = alert.symbols().len(), "Webhook alert delivered");
        Ok(())
    }
}
