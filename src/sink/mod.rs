//! Outbound message delivery.
//!
//! Two interchangeable destinations, chosen once at deployment: reply in the
//! Discord channel the trigger arrived in, or post everything to a single
//! preconfigured webhook. Sends are best-effort; a failed send is logged by
//! the caller and never retried.

pub mod discord;
pub mod webhook;

pub use discord::DiscordRestSink;
pub use webhook::WebhookSink;

use async_trait::async_trait;

/// Where an inbound message came from, for reply targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOrigin {
    pub channel_id: u64,
    pub message_id: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("send request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("send rejected: {0}")]
    Api(String),
    #[error("no announce destination configured")]
    NoAnnounceTarget,
}

/// Text delivery capability shared by the dispatcher and the daily reset.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Send `text` to the conversation `origin` came from.
    async fn reply(&self, origin: &MessageOrigin, text: &str) -> Result<(), SinkError>;

    /// Send `text` to the fixed daily-announcement destination.
    async fn announce(&self, text: &str) -> Result<(), SinkError>;
}
