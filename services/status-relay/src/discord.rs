//! Discord webhook notification client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::WebhookConfig;
use crate::embed::Embed;
use crate::io::HttpClient;
use crate::notifier::Notifier;

/// Posts notification pages to a Discord webhook
pub struct DiscordWebhookNotifier {
    url: String,
    timeout: Duration,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DiscordWebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the webhook URL embeds its token
        f.debug_struct("DiscordWebhookNotifier")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DiscordWebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration, http: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            timeout,
            http,
        }
    }

    /// Build a notifier from config, or `None` when no webhook URL is set
    pub fn from_config(config: &WebhookConfig, http: Arc<dyn HttpClient>) -> Option<Self> {
        let url = config.url.as_deref().filter(|u| !u.is_empty())?;
        tracing::debug!("Created DiscordWebhookNotifier");
        Some(Self::new(
            url,
            Duration::from_secs(config.timeout_seconds.max(1)),
            http,
        ))
    }
}

#[async_trait]
impl Notifier for DiscordWebhookNotifier {
    fn type_name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, embeds: &[Embed]) -> crate::Result<()> {
        let body = serde_json::json!({ "embeds": embeds });

        tracing::debug!("Sending Discord webhook with {} embed(s)", embeds.len());

        let response = self
            .http
            .post_json(&self.url, &body, self.timeout)
            .await
            .map_err(|e| crate::RelayError::NotificationDelivery(e.to_string()))?;

        if !response.is_success() {
            return Err(crate::RelayError::NotificationDelivery(format!(
                "Discord webhook returned status {}: {}",
                response.status, response.body
            )));
        }

        tracing::debug!("Discord webhook sent successfully");
        Ok(())
    }
}
