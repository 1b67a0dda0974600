//! Kandar core library: configuration, WhatsApp channel, keyword reply engine and the
//! webhook gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod reply;
