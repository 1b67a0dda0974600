//! Outbound side of a channel: the seam the reply engine sends through.

use async_trait::async_trait;

/// Failure of one outbound send.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Transport failure or an undecodable response body.
    #[error("send request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The platform answered with a non-2xx status.
    #[error("send api error: {status} {body}")]
    Api { status: u16, body: String },
}

/// Handle to a channel that can deliver text replies.
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "whatsapp").
    fn id(&self) -> &str;

    /// Send a text message to a recipient. Returns the platform's response body.
    async fn send_message(&self, to: &str, text: &str) -> Result<serde_json::Value, SendError>;
}
