//! End-to-end flow over real HTTP doubles: GitHub-backed counter store and
//! webhook output sink against one mockito server.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mockito::{Matcher, Server, ServerGuard};
use tokio::sync::Mutex;

use pillbot::dispatcher::{Dispatcher, InboundMessage};
use pillbot::reset::reset_counter;
use pillbot::sink::webhook::WebhookSink;
use pillbot::sink::{MessageOrigin, OutputSink};
use pillbot::store::github::GithubCounterStore;
use pillbot::store::{CounterDocument, CounterStore};

const CONTENTS_PATH: &str = "/repos/acme/counter/contents/events.json";

fn github_store(server: &ServerGuard) -> Arc<GithubCounterStore> {
    Arc::new(GithubCounterStore::with_api_base(
        "ghp-test".to_string(),
        "acme".to_string(),
        "counter".to_string(),
        "events.json".to_string(),
        server.url(),
    ))
}

fn webhook_sink(server: &ServerGuard) -> Arc<WebhookSink> {
    Arc::new(WebhookSink::new(format!("{}/hook", server.url())))
}

fn encoded_doc(count: u64) -> String {
    BASE64.encode(
        serde_json::to_string_pretty(&CounterDocument { count })
            .unwrap()
            .as_bytes(),
    )
}

fn contents_body(count: u64, sha: &str) -> String {
    serde_json::json!({
        "content": encoded_doc(count),
        "sha": sha,
    })
    .to_string()
}

fn trigger_message() -> InboundMessage {
    InboundMessage {
        sender_id: 42,
        sender_is_bot: false,
        role_ids: vec![],
        content: "よあくんODした".to_string(),
        origin: MessageOrigin {
            channel_id: 100,
            message_id: 200,
        },
    }
}

#[tokio::test]
async fn ninth_to_tenth_trigger_posts_ack_and_milestone() {
    let mut server = Server::new_async().await;

    let get_mock = server
        .mock("GET", CONTENTS_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(contents_body(9, "rev-9"))
        .expect(1)
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", CONTENTS_PATH)
        .match_body(Matcher::Json(serde_json::json!({
            "message": "update counter",
            "content": encoded_doc(10),
            "sha": "rev-9",
        })))
        .with_status(200)
        .with_body(r#"{"content":{"sha":"rev-10"}}"#)
        .expect(1)
        .create_async()
        .await;
    let ack_mock = server
        .mock("POST", "/hook")
        .match_body(Matcher::Json(serde_json::json!({"content": "ｺﾞｯｸﾝ💊"})))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let milestone_mock = server
        .mock("POST", "/hook")
        .match_body(Matcher::Json(
            serde_json::json!({"content": "💊 10回目\nまだイける"}),
        ))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let store: Arc<dyn CounterStore> = github_store(&server);
    let sink: Arc<dyn OutputSink> = webhook_sink(&server);
    let dispatcher = Dispatcher::new(
        store,
        sink,
        Arc::new(Mutex::new(())),
        "よあくんOD".to_string(),
        None,
    );

    dispatcher.handle_message(&trigger_message()).await;

    get_mock.assert_async().await;
    put_mock.assert_async().await;
    ack_mock.assert_async().await;
    milestone_mock.assert_async().await;
}

#[tokio::test]
async fn midnight_reset_announces_total_and_zeroes_remote_document() {
    let mut server = Server::new_async().await;

    let get_mock = server
        .mock("GET", CONTENTS_PATH)
        .with_status(200)
        .with_body(contents_body(47, "rev-47"))
        .expect(1)
        .create_async()
        .await;
    let announce_mock = server
        .mock("POST", "/hook")
        .match_body(Matcher::Json(
            serde_json::json!({"content": "今日は💊 47回飲みました笑笑"}),
        ))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", CONTENTS_PATH)
        .match_body(Matcher::Json(serde_json::json!({
            "message": "update counter",
            "content": encoded_doc(0),
            "sha": "rev-47",
        })))
        .with_status(200)
        .with_body(r#"{"content":{"sha":"rev-48"}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = github_store(&server);
    let sink = webhook_sink(&server);
    let gate = Arc::new(Mutex::new(()));

    reset_counter(store.as_ref(), sink.as_ref(), &gate)
        .await
        .unwrap();

    get_mock.assert_async().await;
    announce_mock.assert_async().await;
    put_mock.assert_async().await;
}

#[tokio::test]
async fn zero_count_reset_stays_silent() {
    let mut server = Server::new_async().await;

    let _get_mock = server
        .mock("GET", CONTENTS_PATH)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;
    let hook_mock = server
        .mock("POST", "/hook")
        .with_status(204)
        .expect(0)
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", CONTENTS_PATH)
        .match_body(Matcher::Json(serde_json::json!({
            "message": "update counter",
            "content": encoded_doc(0),
        })))
        .with_status(201)
        .with_body(r#"{"content":{"sha":"rev-0"}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = github_store(&server);
    let sink = webhook_sink(&server);
    let gate = Arc::new(Mutex::new(()));

    reset_counter(store.as_ref(), sink.as_ref(), &gate)
        .await
        .unwrap();

    hook_mock.assert_async().await;
    put_mock.assert_async().await;
}
