//! Gateway: HTTP server for the platform webhook and health probe.
//!
//! Single port serves `GET /`, `GET /webhook` (verification handshake) and
//! `POST /webhook` (message delivery).

mod server;

pub use server::{router, run_gateway, serve, GatewayState, VerifyQuery};
