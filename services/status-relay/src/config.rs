//! Configuration types for the status relay

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the upstream status URL
pub const ENV_STATUS_URL: &str = "BOT_STATUS_URL";
/// Environment variable holding the upstream bearer token
pub const ENV_STATUS_TOKEN: &str = "BOT_STATUS_TOKEN";
/// Environment variable holding the Discord webhook URL
pub const ENV_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
/// Environment variable holding the shared secret for `/api/*`
pub const ENV_INTERNAL_KEY: &str = "INTERNAL_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Where the bot publishes its health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Discord webhook that receives outage and recovery notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_footer")]
    pub footer: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_timeout_seconds(),
            footer: default_footer(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Shared-secret gate in front of `/api/*`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub internal_key: Option<String>,
    #[serde(default = "default_redirect_to")]
    pub redirect_to: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            internal_key: None,
            redirect_to: default_redirect_to(),
        }
    }
}

/// Optional in-process polling of the status check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_polling_interval")]
    pub interval_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_polling_interval(),
        }
    }
}

/// Presentation and bookkeeping settings of the relay itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            history_size: default_history_size(),
        }
    }
}

impl Config {
    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values count as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_STATUS_URL) {
            tracing::debug!("Upstream status URL taken from {}", ENV_STATUS_URL);
            self.upstream.url = Some(url);
        }
        if let Some(token) = get(ENV_STATUS_TOKEN) {
            self.upstream.token = Some(token);
        }
        if let Some(url) = get(ENV_WEBHOOK_URL) {
            tracing::debug!("Webhook URL taken from {}", ENV_WEBHOOK_URL);
            self.webhook.url = Some(url);
        }
        if let Some(key) = get(ENV_INTERNAL_KEY) {
            self.access.internal_key = Some(key);
        }
    }
}

fn default_timeout_seconds() -> u64 {
    5
}

fn default_footer() -> String {
    "Omex.bot".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_redirect_to() -> String {
    "/".to_string()
}

fn default_polling_interval() -> u64 {
    10
}

fn default_bot_name() -> String {
    "Omex".to_string()
}

fn default_history_size() -> usize {
    100
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::RelayError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
