//! Integration test: serve the router on an ephemeral port and post provider webhooks to it.

use lib::backend::MemoryBackend;
use lib::channels::{Channel, Event};
use lib::config::Config;
use lib::gateway::{router, GatewayState};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const CHANNEL_UUID: &str = "8eb23e93-5ecb-45ba-b726-3b064e0c568c";

const HELLO_MSG: &str = r#"{
  "update_id": 174114370,
  "message": {
    "message_id": 41,
    "from": { "id": 3527065, "first_name": "Nic", "last_name": "Pottier", "username": "nicpottier" },
    "chat": { "id": 3527065, "first_name": "Nic", "last_name": "Pottier", "type": "private" },
    "date": 1454119029,
    "text": "Hello World"
  }
}"#;

struct Harness {
    base: String,
    backend: MemoryBackend,
    client: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        let mut config = Config::default();
        config.channels.push(Channel::new(
            Uuid::parse_str(CHANNEL_UUID).unwrap(),
            "RC",
            "",
            "US",
            json!({ "auth_token": "a123", "user_id": "LPCCTNijXfnTXz6pf" })
                .as_object()
                .cloned()
                .unwrap(),
        ));
        let backend = MemoryBackend::new();
        let state = GatewayState::from_config(config, Arc::new(backend.clone()))
            .await
            .expect("state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });
        Self {
            base: format!("http://{}", addr),
            backend,
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, path: &str, body: &str) -> (u16, Value) {
        let resp = self
            .client
            .post(format!("{}{}", self.base, path))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("post");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("json body"))
    }

    async fn receive(&self, body: &str) -> (u16, Value) {
        self.post(&format!("/c/rc/{}/receive", CHANNEL_UUID), body).await
    }
}

#[tokio::test]
async fn hello_is_accepted_and_stored() {
    let h = Harness::start().await;
    let (status, body) = h.receive(HELLO_MSG).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Accepted");
    assert_eq!(body["data"][0]["type"], "msg");
    assert_eq!(body["data"][0]["urn"], "rocketchat:3527065#nicpottier");
    assert_eq!(body["data"][0]["text"], "Hello World");
    assert_eq!(body["data"][0]["external_id"], "41");

    let events = h.backend.events().await;
    assert_eq!(events.len(), 1);
    let Event::IncomingMessage(msg) = &events[0] else {
        panic!("expected incoming message");
    };
    assert_eq!(msg.received_on.to_rfc3339(), "2016-01-30T01:57:09+00:00");

    let logs = h.backend.logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].label(), "Message Receive");
    assert!(!logs[0].is_error());
}

#[tokio::test]
async fn start_command_yields_new_conversation() {
    let h = Harness::start().await;
    let (status, body) = h.receive(&HELLO_MSG.replace("Hello World", "/start")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["type"], "event");
    assert_eq!(body["data"][0]["event_type"], "new_conversation");
    assert!(matches!(
        h.backend.events().await.as_slice(),
        [Event::NewConversation(_)]
    ));
}

#[tokio::test]
async fn empty_update_is_ignored_without_events() {
    let h = Harness::start().await;
    let (status, body) = h.receive(r#"{"update_id": 174114370}"#).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Ignored");
    assert_eq!(body["data"][0]["info"], "Ignoring request, no message");
    assert!(h.backend.events().await.is_empty());
    assert_eq!(h.backend.logs().await[0].label(), "Request Ignored");
}

#[tokio::test]
async fn malformed_body_is_rejected_and_logged() {
    let h = Harness::start().await;
    let (status, body) = h.receive("not json").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Error");
    assert!(h.backend.events().await.is_empty());
    let logs = h.backend.logs().await;
    assert_eq!(logs[0].label(), "Request Error");
    assert!(logs[0].is_error());
}

#[tokio::test]
async fn missing_sender_id_is_rejected_with_error_body() {
    let h = Harness::start().await;
    for body in [
        r#"{"message": {"message_id": 41, "date": 1454119029, "text": "Hello World"}}"#,
        r#"{"message": {"message_id": 41, "from": {"id": 0, "username": "nicpottier"}, "date": 1454119029, "text": "Hello World"}}"#,
    ] {
        let (status, resp) = h.receive(body).await;
        assert_eq!(status, 400, "{}", body);
        assert_eq!(resp["message"], "Error");
        assert_eq!(resp["data"][0]["type"], "error");
        assert!(resp["data"][0]["error"].as_str().unwrap().contains("remote id"));
    }
    assert!(h.backend.events().await.is_empty());
    let logs = h.backend.logs().await;
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.label() == "Request Error" && l.is_error()));
}

#[tokio::test]
async fn non_ascii_username_is_accepted_without_handle() {
    let h = Harness::start().await;
    let (status, body) = h.receive(&HELLO_MSG.replace("nicpottier", "José")).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Accepted");
    assert_eq!(body["data"][0]["urn"], "rocketchat:3527065");
}

#[tokio::test]
async fn unknown_channel_is_not_found() {
    let h = Harness::start().await;
    let (status, _) = h
        .post(&format!("/c/rc/{}/receive", Uuid::new_v4()), HELLO_MSG)
        .await;
    assert_eq!(status, 404);

    let (status, _) = h.post("/c/rc/not-a-uuid/receive", HELLO_MSG).await;
    assert_eq!(status, 404);

    let (status, _) = h
        .post(&format!("/c/tg/{}/receive", CHANNEL_UUID), HELLO_MSG)
        .await;
    assert_eq!(status, 404);
    assert!(h.backend.logs().await.is_empty());
}
