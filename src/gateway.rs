//! Discord Gateway client: receives message events over serenity's
//! WebSocket connection and feeds them to the dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::all::{Context, EventHandler, GatewayIntents, Message, Ready};
use serenity::async_trait;
use serenity::Client;
use tracing::info;

use crate::dispatcher::{CounterGate, Dispatcher, InboundMessage};
use crate::reset::run_daily_reset;
use crate::sink::{MessageOrigin, OutputSink};
use crate::store::CounterStore;

/// Serenity event handler wired to the dispatcher and the daily reset.
pub struct BotEventHandler {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn CounterStore>,
    sink: Arc<dyn OutputSink>,
    gate: CounterGate,
    own_user_id: Option<u64>,
    reset_armed: AtomicBool,
}

impl BotEventHandler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        store: Arc<dyn CounterStore>,
        sink: Arc<dyn OutputSink>,
        gate: CounterGate,
        own_user_id: Option<u64>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            sink,
            gate,
            own_user_id,
            reset_armed: AtomicBool::new(false),
        }
    }

    /// Convert a serenity message to the dispatcher's normalized form.
    fn normalize(&self, msg: &Message) -> InboundMessage {
        let own_message = self.own_user_id == Some(msg.author.id.get());
        let role_ids = msg
            .member
            .as_ref()
            .map(|member| member.roles.iter().map(|role| role.get()).collect())
            .unwrap_or_default();
        InboundMessage {
            sender_id: msg.author.id.get(),
            sender_is_bot: msg.author.bot || own_message,
            role_ids,
            content: msg.content.clone(),
            origin: MessageOrigin {
                channel_id: msg.channel_id.get(),
                message_id: msg.id.get(),
            },
        }
    }
}

#[async_trait]
impl EventHandler for BotEventHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            "logged in as {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );
        // Reconnects fire ready again; the reset loop must start only once.
        if !self.reset_armed.swap(true, Ordering::SeqCst) {
            tokio::spawn(run_daily_reset(
                self.store.clone(),
                self.sink.clone(),
                self.gate.clone(),
            ));
            info!("daily reset scheduler armed");
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = self.normalize(&msg);
        self.dispatcher.handle_message(&inbound).await;
    }
}

/// Connect to the Gateway and block until the client stops.
pub async fn start_discord_client(
    token: &str,
    handler: BotEventHandler,
) -> Result<(), serenity::Error> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await?;

    info!("starting Discord Gateway client");
    client.start().await
}
