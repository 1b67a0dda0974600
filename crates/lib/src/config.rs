//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.kandar/config.json`), then environment
//! variables override individual fields. Built once at startup and shared read-only.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder prefix used by the default credentials.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

/// Top-level application config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// WhatsApp Cloud API credentials and endpoint.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// HTTP bind address and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the webhook and health endpoints (default 3000). Overridden by PORT env.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the platform must be able to reach the webhook).
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// WhatsApp Cloud API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Bearer token for the send-message API. Overridden by WHATSAPP_TOKEN env.
    #[serde(default = "default_token")]
    pub token: String,

    /// Business phone number id used in the send path. Overridden by PHONE_NUMBER_ID env.
    #[serde(default = "default_phone_number_id")]
    pub phone_number_id: String,

    /// Secret echoed by the platform during the verification handshake. Overridden by VERIFY_TOKEN env.
    #[serde(default = "default_verify_token")]
    pub verify_token: String,

    /// Graph API base, without trailing slash. Overridden by WHATSAPP_API_URL env.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_port() -> u16 {
    3000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_token() -> String {
    "YOUR_WHATSAPP_ACCESS_TOKEN".to_string()
}

fn default_phone_number_id() -> String {
    "YOUR_PHONE_NUMBER_ID".to_string()
}

fn default_verify_token() -> String {
    "YOUR_VERIFY_TOKEN".to_string()
}

fn default_api_url() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            token: default_token(),
            phone_number_id: default_phone_number_id(),
            verify_token: default_verify_token(),
            api_url: default_api_url(),
        }
    }
}

/// Trim a raw override value; blank => None.
fn nonblank(raw: String) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Read an env var through [`nonblank`].
fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(nonblank)
}

/// Apply overrides from a lookup function. Split out from [`apply_env_overrides`] so tests
/// need not touch the process environment.
fn apply_overrides_with<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("invalid PORT value: {}", port))?;
    }
    if let Some(token) = lookup("WHATSAPP_TOKEN") {
        config.whatsapp.token = token;
    }
    if let Some(id) = lookup("PHONE_NUMBER_ID") {
        config.whatsapp.phone_number_id = id;
    }
    if let Some(verify) = lookup("VERIFY_TOKEN") {
        config.whatsapp.verify_token = verify;
    }
    if let Some(url) = lookup("WHATSAPP_API_URL") {
        config.whatsapp.api_url = url.trim_end_matches('/').to_string();
    }
    Ok(())
}

/// Override config fields from PORT, WHATSAPP_TOKEN, PHONE_NUMBER_ID, VERIFY_TOKEN and
/// WHATSAPP_API_URL. Values are trimmed before use, so `VERIFY_TOKEN=" abc "` sets the
/// verify token to `abc`; blank or whitespace-only values are ignored.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_with(config, env_nonempty)
}

/// Names of credential fields still holding their `YOUR_...` placeholder.
pub fn placeholder_fields(config: &Config) -> Vec<&'static str> {
    let w = &config.whatsapp;
    [
        ("whatsapp.token", &w.token),
        ("whatsapp.phoneNumberId", &w.phone_number_id),
        ("whatsapp.verifyToken", &w.verify_token),
    ]
    .into_iter()
    .filter(|(_, v)| v.starts_with(PLACEHOLDER_PREFIX))
    .map(|(name, _)| name)
    .collect()
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("KANDAR_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".kandar").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path (or KANDAR_CONFIG_PATH / default). Missing file => default config.
/// Environment overrides are not applied here; see [`apply_env_overrides`].
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Write a default config file if none exists. Returns true when a file was created.
pub fn write_default_config(path: &std::path::Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let body = serde_json::to_string_pretty(&Config::default())?;
    std::fs::write(path, body)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    log::info!("created default config at {}", path.display());
    Ok(true)
}
