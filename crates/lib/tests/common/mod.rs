//! Shared helpers: a stand-in Graph API that records sendMessage calls, and a gateway
//! spawned on an ephemeral port.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use kandar::channels::WhatsAppChannel;
use kandar::config::Config;
use kandar::gateway::{self, GatewayState};
use std::sync::{Arc, Mutex};

pub const PHONE_NUMBER_ID: &str = "1055";
pub const ACCESS_TOKEN: &str = "EAAtest";
pub const VERIFY_TOKEN: &str = "nasi_kandar_verify";

/// One POST received by the stand-in Graph API.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub phone_number_id: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
pub struct MockGraph {
    pub base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGraph {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    status: StatusCode,
}

async fn messages(
    State(state): State<MockState>,
    Path(phone_number_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let to = body["to"].clone();
    state.calls.lock().unwrap().push(RecordedCall {
        phone_number_id,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });
    if state.status.is_success() {
        (
            state.status,
            Json(serde_json::json!({
                "messaging_product": "whatsapp",
                "contacts": [{ "input": to, "wa_id": to }],
                "messages": [{ "id": "wamid.TEST" }]
            })),
        )
    } else {
        (
            state.status,
            Json(serde_json::json!({
                "error": { "message": "Invalid OAuth access token.", "code": 190 }
            })),
        )
    }
}

/// Start a Graph API stand-in answering every send with `status`.
pub async fn spawn_mock_graph(status: StatusCode) -> MockGraph {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/:phone_number_id/messages", post(messages))
        .with_state(MockState {
            calls: calls.clone(),
            status,
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock graph");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    MockGraph {
        base_url: format!("http://{}", addr),
        calls,
    }
}

pub fn test_config(api_url: &str) -> Config {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.whatsapp.api_url = api_url.to_string();
    config.whatsapp.phone_number_id = PHONE_NUMBER_ID.to_string();
    config.whatsapp.token = ACCESS_TOKEN.to_string();
    config.whatsapp.verify_token = VERIFY_TOKEN.to_string();
    config
}

/// Spawn the gateway with the real WhatsApp channel; returns its base URL.
pub async fn spawn_gateway(config: Config) -> String {
    let channel = Arc::new(WhatsAppChannel::new(&config.whatsapp));
    let state = GatewayState::new(config, channel);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = gateway::serve(listener, state, std::future::pending()).await;
    });
    format!("http://{}", addr)
}

/// Inbound text message envelope as the platform delivers it.
pub fn text_envelope(from: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "display_phone_number": "15550783881", "phone_number_id": PHONE_NUMBER_ID },
                    "contacts": [{ "profile": { "name": "Aisyah" }, "wa_id": from }],
                    "messages": [{
                        "from": from,
                        "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                        "timestamp": "1749416383",
                        "type": "text",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
}
