//! Inbound message from a channel: handed to the reply engine, never stored.

/// A text message received from a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone identifier; replies go back to this address.
    pub from: String,
    /// Message text; empty when the message carried no text body.
    pub body: String,
    /// Platform message id.
    pub id: String,
}

/// Result of decoding a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// A well-formed message to answer.
    Message(InboundMessage),
    /// Nothing to answer; the reason is only used for logging.
    NoMessage(&'static str),
}
