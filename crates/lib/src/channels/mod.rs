//! Communication channels.
//!
//! The webhook payload is decoded into an [`Intake`]; replies leave through a
//! [`ChannelHandle`]. WhatsApp Cloud API is the only channel.

mod handle;
mod inbound;
mod whatsapp;

pub use handle::{ChannelHandle, SendError};
pub use inbound::{InboundMessage, Intake};
pub use whatsapp::{
    decode_webhook, OutboundReply, OutboundText, WebhookPayload, WhatsAppChannel,
    WHATSAPP_BUSINESS_ACCOUNT,
};
