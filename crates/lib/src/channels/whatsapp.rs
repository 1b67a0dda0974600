//! WhatsApp Cloud API channel: webhook payload decoding and sendMessage via the Graph API.

use crate::channels::handle::{ChannelHandle, SendError};
use crate::channels::inbound::{InboundMessage, Intake};
use crate::config::WhatsAppConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Value of `object` on deliveries from a WhatsApp Business account.
pub const WHATSAPP_BUSINESS_ACCOUNT: &str = "whatsapp_business_account";

/// Webhook POST body. Only the first element of `entry`, `changes` and `messages` is
/// decoded into a typed struct; later siblings stay raw JSON and never affect the result.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// `{ "body": ... }` on text messages; anything else reads as an empty body.
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

/// Decode the first element of a list, ignoring the rest.
fn first_as<T: DeserializeOwned>(
    items: Vec<serde_json::Value>,
    missing: &'static str,
    malformed: &'static str,
) -> Result<T, &'static str> {
    let item = items.into_iter().next().ok_or(missing)?;
    serde_json::from_value(item).map_err(|e| {
        log::debug!("whatsapp webhook: {}: {}", malformed, e);
        malformed
    })
}

impl WebhookPayload {
    /// Pick the first message of the first change of the first entry.
    pub fn into_intake(self) -> Intake {
        match self.first_message() {
            Ok(msg) => Intake::Message(msg),
            Err(reason) => Intake::NoMessage(reason),
        }
    }

    fn first_message(self) -> Result<InboundMessage, &'static str> {
        if self.object != WHATSAPP_BUSINESS_ACCOUNT {
            return Err("unexpected object type");
        }
        let entry: WebhookEntry = first_as(self.entry, "no entry", "malformed entry")?;
        let change: WebhookChange = first_as(entry.changes, "no change", "malformed change")?;
        let value = change.value.ok_or("change has no value")?;
        let message: WebhookMessage =
            first_as(value.messages, "no messages", "malformed message")?;
        let from = message
            .from
            .filter(|f| !f.is_empty())
            .ok_or("message has no sender")?;
        let body = message
            .text
            .as_ref()
            .and_then(|t| t.get("body"))
            .and_then(|b| b.as_str())
            .unwrap_or_default()
            .to_string();
        Ok(InboundMessage {
            from,
            body,
            id: message.id.unwrap_or_default(),
        })
    }
}

/// Decode a raw webhook body. Bodies that are not JSON are treated like any other
/// payload without a message.
pub fn decode_webhook(body: &[u8]) -> Intake {
    match serde_json::from_slice::<WebhookPayload>(body) {
        Ok(payload) => payload.into_intake(),
        Err(e) => {
            log::debug!("whatsapp webhook body is not a valid envelope: {}", e);
            Intake::NoMessage("undecodable body")
        }
    }
}

/// sendMessage request body for a plain text reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundReply {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: OutboundText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundText {
    pub body: String,
}

impl OutboundReply {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to: to.into(),
            kind: "text",
            text: OutboundText { body: body.into() },
        }
    }
}

/// WhatsApp Cloud API connector: sends text replies for one business phone number.
pub struct WhatsAppChannel {
    id: String,
    api_url: String,
    phone_number_id: String,
    token: String,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            id: "whatsapp".to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            phone_number_id: config.phone_number_id.clone(),
            token: config.token.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// `{api_url}/{phone_number_id}/messages`
    pub fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_url, self.phone_number_id)
    }

    /// POST one text message. Failures are logged here with whatever detail the
    /// platform returned, then handed back to the caller.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<serde_json::Value, SendError> {
        match self.post_reply(&OutboundReply::text(to, body)).await {
            Ok(data) => {
                log::info!("whatsapp message sent successfully: {}", data);
                Ok(data)
            }
            Err(e) => {
                log::error!("whatsapp error sending message to {}: {}", to, e);
                Err(e)
            }
        }
    }

    async fn post_reply(&self, reply: &OutboundReply) -> Result<serde_json::Value, SendError> {
        let res = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.token)
            .json(reply)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(SendError::Api { status, body });
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl ChannelHandle for WhatsAppChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_message(&self, to: &str, text: &str) -> Result<serde_json::Value, SendError> {
        self.send_text(to, text).await
    }
}
