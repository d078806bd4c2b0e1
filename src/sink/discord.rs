//! Discord REST sink: replies in the originating channel, announces to a
//! configured channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use super::{MessageOrigin, OutputSink, SinkError};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DiscordRestSink {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    /// Destination of the daily announcement. When unset, announcements are
    /// skipped (the reference picked an arbitrary joined channel instead;
    /// that selection was non-deterministic and is deliberately not kept).
    announce_channel_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_reference: Option<MessageReference>,
}

#[derive(Debug, Serialize)]
struct MessageReference {
    message_id: u64,
}

impl DiscordRestSink {
    pub fn new(bot_token: String, announce_channel_id: Option<u64>) -> Self {
        Self::with_api_base(bot_token, announce_channel_id, DEFAULT_API_BASE.to_string())
    }

    pub fn with_api_base(
        bot_token: String,
        announce_channel_id: Option<u64>,
        api_base: String,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            announce_channel_id,
        }
    }

    async fn post_message(
        &self,
        channel_id: u64,
        request: &CreateMessageRequest<'_>,
    ) -> Result<(), SinkError> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(request)
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
impl OutputSink for DiscordRestSink {
    async fn reply(&self, origin: &MessageOrigin, text: &str) -> Result<(), SinkError> {
        self.post_message(
            origin.channel_id,
            &CreateMessageRequest {
                content: text,
                message_reference: Some(MessageReference {
                    message_id: origin.message_id,
                }),
            },
        )
        .await
    }

    async fn announce(&self, text: &str) -> Result<(), SinkError> {
        let channel_id = match self.announce_channel_id {
            Some(id) => id,
            None => {
                warn!("DISCORD_ANNOUNCE_CHANNEL_ID not set, dropping announcement");
                return Err(SinkError::NoAnnounceTarget);
            }
        };
        self.post_message(
            channel_id,
            &CreateMessageRequest {
                content: text,
                message_reference: None,
            },
        )
        .await
    }
}
