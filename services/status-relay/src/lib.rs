//! Status relay - bot status endpoint with outage notifications
//!
//! Polls the bot's upstream status endpoint on demand, tracks online/offline
//! transitions across requests, and relays outage and recovery notifications to
//! a Discord webhook.

pub mod clock;
pub mod config;
pub mod discord;
pub mod embed;
pub mod error;
pub mod io;
pub mod notifier;
pub mod poller;
pub mod relay;
pub mod server;
pub mod state;
pub mod status;

pub use config::{load_config, Config};
pub use error::{RelayError, Result};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::discord::DiscordWebhookNotifier;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::Notifier;
use crate::relay::StatusRelay;

/// Assembles a [`RelayService`] from configuration and optional test doubles
pub struct RelayBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl RelayBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            notifier: None,
            clock: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the webhook notifier derived from config
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<RelayService> {
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let notifier = self.notifier.or_else(|| {
            DiscordWebhookNotifier::from_config(&self.config.webhook, Arc::clone(&http))
                .map(|n| Arc::new(n) as Arc<dyn Notifier>)
        });
        if notifier.is_none() {
            tracing::info!("No webhook configured, transition notifications are disabled");
        }
        if self.config.upstream.url.is_none() {
            tracing::warn!("No upstream status URL configured, /api/status will report an error");
        }

        let state = state::new_state_handle(self.config.relay.history_size);
        let relay = Arc::new(StatusRelay::new(
            &self.config,
            http,
            notifier,
            state,
            clock,
        ));

        Ok(RelayService {
            config: self.config,
            relay,
            cancel: CancellationToken::new(),
        })
    }
}

/// A configured relay, ready to serve
#[derive(Debug)]
pub struct RelayService {
    config: Config,
    relay: Arc<StatusRelay>,
    cancel: CancellationToken,
}

impl RelayService {
    pub fn relay(&self) -> &Arc<StatusRelay> {
        &self.relay
    }

    /// Token that stops the server and poller when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn router(&self) -> Router {
        server::build_router(Arc::clone(&self.relay), self.config.access.clone())
    }

    /// Bind the configured address and serve until ctrl-c
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        )
        .parse()
        .map_err(|e| {
            RelayError::Config(format!(
                "Invalid listen address {}:{}: {}",
                self.config.server.bind_address, self.config.server.port, e
            ))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            RelayError::Io(e)
        })?;

        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
            }
            cancel_for_signal.cancel();
        });

        self.serve(listener).await
    }

    /// Serve on an already bound listener until the cancellation token fires
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        tracing::info!("Status relay listening on http://{}", local);

        let poller = if self.config.poller.enabled {
            let interval = Duration::from_secs(self.config.poller.interval_seconds.max(1));
            tracing::info!("Polling upstream status every {:?}", interval);
            Some(tokio::spawn(poller::poll_loop(
                Arc::clone(&self.relay),
                interval,
                self.cancel.clone(),
            )))
        } else {
            None
        };

        let router = self.router();
        let cancel = self.cancel.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await
            .map_err(|e| RelayError::Server(e.to_string()))?;

        self.cancel.cancel();
        if let Some(handle) = poller {
            if let Err(e) = handle.await {
                tracing::warn!("Status poller ended abnormally: {}", e);
            }
        }

        let grace = Duration::from_secs(self.config.webhook.timeout_seconds.max(1) + 1);
        if !self.relay.drain_notifications(grace).await {
            tracing::warn!(
                "Notification deliveries still pending after {:?}, giving up",
                grace
            );
        }

        tracing::info!("Status relay stopped");
        Ok(())
    }
}
