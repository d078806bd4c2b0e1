use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use pillbot::config::ServiceConfig;
use pillbot::dispatcher::Dispatcher;
use pillbot::gateway::{start_discord_client, BotEventHandler};
use pillbot::server;
use pillbot::sink::{DiscordRestSink, OutputSink, WebhookSink};
use pillbot::store::{CounterStore, FileCounterStore, GithubCounterStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_target(false).init();
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env()?;

    // The port must be answering probes before the slower Gateway handshake.
    let listener = server::bind_health_server(&config.host, config.port).await?;
    tokio::spawn(async move {
        if let Err(err) = server::serve_health(listener).await {
            error!("health server stopped: {}", err);
        }
    });

    let store: Arc<dyn CounterStore> = match &config.remote_store {
        Some(remote) => {
            info!(
                "counter backend: github {}/{} {}",
                remote.owner, remote.repo, remote.file_path
            );
            Arc::new(GithubCounterStore::with_api_base(
                remote.token.clone(),
                remote.owner.clone(),
                remote.repo.clone(),
                remote.file_path.clone(),
                remote.api_base.clone(),
            ))
        }
        None => {
            info!("counter backend: file {}", config.counter_file.display());
            Arc::new(FileCounterStore::new(&config.counter_file))
        }
    };

    let sink: Arc<dyn OutputSink> = match &config.webhook_url {
        Some(url) => {
            info!("output sink: webhook");
            Arc::new(WebhookSink::new(url.clone()))
        }
        None => {
            info!("output sink: discord channel reply");
            Arc::new(DiscordRestSink::with_api_base(
                config.discord_bot_token.clone(),
                config.announce_channel_id,
                config.discord_api_base.clone(),
            ))
        }
    };

    let gate = Arc::new(Mutex::new(()));
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        sink.clone(),
        gate.clone(),
        config.trigger_word.clone(),
        config.required_role_id,
    ));
    let handler = BotEventHandler::new(
        dispatcher,
        store,
        sink,
        gate,
        config.discord_bot_user_id,
    );

    tokio::select! {
        result = start_discord_client(&config.discord_bot_token, handler) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }
    Ok(())
}
