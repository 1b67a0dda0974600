//! Gateway HTTP server (single port).

use crate::channels::{decode_webhook, ChannelHandle, Intake, WhatsAppChannel};
use crate::config::{self, Config};
use crate::reply;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

/// Shared state for the gateway. Immutable after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Where replies are sent.
    pub channel: Arc<dyn ChannelHandle>,
}

impl GatewayState {
    pub fn new(config: Config, channel: Arc<dyn ChannelHandle>) -> Self {
        Self {
            config: Arc::new(config),
            channel,
        }
    }
}

/// Query string of the verification handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl VerifyQuery {
    /// The challenge to echo when mode is set and the token matches, else None.
    pub fn accept(self, expected_token: &str) -> Option<String> {
        let mode_set = self.mode.as_deref().is_some_and(|m| !m.is_empty());
        if mode_set && self.verify_token.as_deref() == Some(expected_token) {
            Some(self.challenge.unwrap_or_default())
        } else {
            None
        }
    }
}

/// Build the HTTP routes over the given state.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` completes.
pub async fn serve<F>(listener: tokio::net::TcpListener, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("gateway server exited")
}

/// Run the gateway server; binds to config.server.bind:config.server.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    for field in config::placeholder_fields(&config) {
        log::warn!("{} is still a placeholder; set it in the config file or environment", field);
    }

    let channel: Arc<dyn ChannelHandle> = Arc::new(WhatsAppChannel::new(&config.whatsapp));
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let port = config.server.port;
    let state = GatewayState::new(config, channel);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);
    log::info!("webhook URL: http://localhost:{}/webhook", port);

    serve(listener, state, shutdown_signal()).await?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http() -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "message": "WhatsApp Bot is active",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }))
}

/// GET /webhook — verification handshake; echoes hub.challenge when the token matches.
async fn verify_webhook(
    State(state): State<GatewayState>,
    query: Option<Query<VerifyQuery>>,
) -> (StatusCode, String) {
    // An undecodable query string (e.g. a repeated hub.mode) fails the handshake.
    let accepted = query.and_then(|Query(q)| q.accept(&state.config.whatsapp.verify_token));
    match accepted {
        Some(challenge) => {
            log::info!("webhook verified successfully");
            (StatusCode::OK, challenge)
        }
        None => {
            log::warn!("webhook verification rejected");
            (StatusCode::FORBIDDEN, "Forbidden".to_string())
        }
    }
}

/// POST /webhook — receives the platform envelope; answers the first text message.
async fn receive_webhook(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let msg = match decode_webhook(&body) {
        Intake::Message(msg) => msg,
        Intake::NoMessage(reason) => {
            log::debug!("webhook delivery ignored: {}", reason);
            return (StatusCode::OK, Json(json!({ "status": "ok" })));
        }
    };
    log::info!("received message from {}: {}", msg.from, msg.body);
    match reply::handle_incoming_message(state.channel.as_ref(), &msg).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            log::error!("error processing webhook: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(mode: Option<&str>, token: Option<&str>, challenge: Option<&str>) -> VerifyQuery {
        VerifyQuery {
            mode: mode.map(String::from),
            verify_token: token.map(String::from),
            challenge: challenge.map(String::from),
        }
    }

    #[test]
    fn accept_echoes_challenge_on_matching_token() {
        let q = query(Some("subscribe"), Some("secret"), Some("1158201444"));
        assert_eq!(q.accept("secret"), Some("1158201444".to_string()));
    }

    #[test]
    fn accept_any_nonempty_mode() {
        let q = query(Some("anything"), Some("secret"), Some("c"));
        assert_eq!(q.accept("secret"), Some("c".to_string()));
    }

    #[test]
    fn accept_without_challenge_echoes_empty() {
        let q = query(Some("subscribe"), Some("secret"), None);
        assert_eq!(q.accept("secret"), Some(String::new()));
    }

    #[test]
    fn reject_wrong_token_or_missing_mode() {
        assert_eq!(query(Some("subscribe"), Some("nope"), Some("c")).accept("secret"), None);
        assert_eq!(query(Some("subscribe"), None, Some("c")).accept("secret"), None);
        assert_eq!(query(None, Some("secret"), Some("c")).accept("secret"), None);
        assert_eq!(query(Some(""), Some("secret"), Some("c")).accept("secret"), None);
    }

    #[test]
    fn verify_query_from_hub_params() {
        let json = r#"{"hub.mode":"subscribe","hub.verify_token":"t","hub.challenge":"42"}"#;
        let q: VerifyQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.mode.as_deref(), Some("subscribe"));
        assert_eq!(q.verify_token.as_deref(), Some("t"));
        assert_eq!(q.challenge.as_deref(), Some("42"));
    }
}
