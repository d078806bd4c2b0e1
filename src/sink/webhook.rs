//! Webhook sink: every message, reply or announcement, goes to one fixed
//! URL as `{"content": text}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{MessageOrigin, OutputSink, SinkError};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, url }
    }

    async fn post(&self, text: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: text })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SinkError::Api(format!("{}: {}", status, body)))
        }
    }
}

#[async_trait]
impl OutputSink for WebhookSink {
    async fn reply(&self, _origin: &MessageOrigin, text: &str) -> Result<(), SinkError> {
        // Webhook deployments have no channel context; the origin is unused.
        self.post(text).await
    }

    async fn announce(&self, text: &str) -> Result<(), SinkError> {
        self.post(text).await
    }
}
