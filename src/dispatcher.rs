//! Inbound message handling: trigger detection, counter increment, replies.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::messages;
use crate::sink::{MessageOrigin, OutputSink};
use crate::store::{CounterStore, StoreError, CONFLICT_RETRY_ATTEMPTS};

/// Serializes every load-increment-save sequence against the daily reset so
/// interleaved handlers cannot lose an update.
pub type CounterGate = Arc<Mutex<()>>;

/// Chat-platform-agnostic view of an inbound message. The gateway produces
/// these from serenity events; tests build them directly.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: u64,
    pub sender_is_bot: bool,
    pub role_ids: Vec<u64>,
    pub content: String,
    pub origin: MessageOrigin,
}

pub struct Dispatcher {
    store: Arc<dyn CounterStore>,
    sink: Arc<dyn OutputSink>,
    gate: CounterGate,
    trigger_word: String,
    /// Role gate: when set, only members carrying this role are counted.
    required_role_id: Option<u64>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn CounterStore>,
        sink: Arc<dyn OutputSink>,
        gate: CounterGate,
        trigger_word: String,
        required_role_id: Option<u64>,
    ) -> Self {
        Self {
            store,
            sink,
            gate,
            trigger_word,
            required_role_id,
        }
    }

    /// Handle one inbound message. Never returns an error: anything that
    /// goes wrong past the filters is logged and the bot keeps running.
    pub async fn handle_message(&self, message: &InboundMessage) {
        if message.sender_is_bot {
            return;
        }

        if let Some(required) = self.required_role_id {
            if !message.role_ids.contains(&required) {
                debug!("sender {} lacks required role, ignoring", message.sender_id);
                return;
            }
        }

        if !message.content.contains(&self.trigger_word) {
            return;
        }

        let new_count = match self.increment_count().await {
            Ok(count) => count,
            Err(err) => {
                warn!("counter increment failed: {}", err);
                return;
            }
        };
        info!(
            "trigger from {} in channel {}, count now {}",
            message.sender_id, message.origin.channel_id, new_count
        );

        // Sends are best-effort; the increment is never rolled back.
        if let Err(err) = self.sink.reply(&message.origin, messages::ACK_MESSAGE).await {
            warn!("acknowledgement send failed: {}", err);
        }

        if new_count % 10 == 0 {
            if let Some(phrase) = messages::phrase_for(new_count) {
                let text = messages::format_milestone(new_count, phrase);
                if let Err(err) = self.sink.reply(&message.origin, &text).await {
                    warn!("milestone send failed: {}", err);
                }
            }
        }
    }

    /// Load, add one, save. Holds the counter gate for the whole sequence
    /// and retries the sequence when the remote backend reports a conflict.
    async fn increment_count(&self) -> Result<u64, StoreError> {
        let _guard = self.gate.lock().await;
        for attempt in 1..=CONFLICT_RETRY_ATTEMPTS {
            let (mut doc, token) = self.store.load().await?;
            doc.count += 1;
            match self.store.save(&doc, token.as_ref()).await {
                Ok(()) => return Ok(doc.count),
                Err(StoreError::Conflict) => {
                    warn!(
                        "counter save conflicted (attempt {}/{})",
                        attempt, CONFLICT_RETRY_ATTEMPTS
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Err(StoreError::Conflict)
    }
}
