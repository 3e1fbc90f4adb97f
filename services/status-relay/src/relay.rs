//! Relay: fetches upstream status, tracks outages and dispatches notifications

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::clock::Clock;
use crate::config::{Config, UpstreamConfig};
use crate::embed::{build_embeds, FetchMeta, NotificationEvent, OutageMeta};
use crate::io::HttpClient;
use crate::notifier::{dispatch, Dispatch, NotificationKind, Notifier};
use crate::state::{StateHandle, Transition};
use crate::status::{BotStatusPayload, StatusResponse};
use crate::RelayError;

/// Result of one status check
#[derive(Debug)]
pub struct CheckOutcome {
    /// HTTP status the endpoint should answer with
    pub http_status: u16,
    pub response: StatusResponse,
    /// Background delivery of the transition notification, if one was sent
    pub notification: Option<JoinHandle<()>>,
}

/// What a successful upstream fetch produced
struct Fetched {
    http_status: u16,
    payload: BotStatusPayload,
    /// Body as the upstream sent it, before any coercion
    raw: serde_json::Value,
}

/// The status relay
pub struct StatusRelay {
    upstream: UpstreamConfig,
    bot_name: String,
    footer: String,
    http: Arc<dyn HttpClient>,
    notifier: Option<Arc<dyn Notifier>>,
    state: StateHandle,
    clock: Arc<dyn Clock>,
    deliveries: TaskTracker,
}

impl std::fmt::Debug for StatusRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRelay")
            .field("bot_name", &self.bot_name)
            .field("upstream_configured", &self.upstream.url.is_some())
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl StatusRelay {
    pub fn new(
        config: &Config,
        http: Arc<dyn HttpClient>,
        notifier: Option<Arc<dyn Notifier>>,
        state: StateHandle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            upstream: config.upstream.clone(),
            bot_name: config.relay.bot_name.clone(),
            footer: config.webhook.footer.clone(),
            http,
            notifier,
            state,
            clock,
            deliveries: TaskTracker::new(),
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Wait for notification deliveries still in flight.
    ///
    /// Returns `false` when some were still running after `timeout`.
    pub async fn drain_notifications(&self, timeout: Duration) -> bool {
        self.deliveries.close();
        let pending = self.deliveries.len();
        if pending > 0 {
            tracing::info!("Waiting for {} notification delivery(ies)", pending);
        }
        tokio::time::timeout(timeout, self.deliveries.wait())
            .await
            .is_ok()
    }

    /// Poll the upstream once, update the outage state and report.
    ///
    /// Never fails: every error is folded into the returned response.
    pub async fn check_status(&self) -> CheckOutcome {
        let Some(url) = self.upstream.url.as_deref().filter(|u| !u.is_empty()) else {
            let err = RelayError::Config("status url is not set".to_string());
            tracing::error!("{}", err);
            return CheckOutcome {
                http_status: err.http_status(),
                response: StatusResponse::failure(err.to_string()),
                notification: None,
            };
        };

        let started = Instant::now();
        let fetched = self.fetch(url).await;
        let response_ms = started.elapsed().as_millis() as u64;

        match fetched {
            Ok(fetched) => {
                tracing::debug!(
                    "Upstream reports online={} shards={} ({} ms)",
                    fetched.payload.online,
                    fetched.payload.shard_count,
                    response_ms
                );
                let is_down = fetched.payload.is_down();
                let notification = self.observe(is_down).await.and_then(|t| {
                    let fetch = FetchMeta {
                        url: Some(url.to_string()),
                        http_status: Some(fetched.http_status),
                        http_ok: Some(true),
                        error_message: None,
                        response_ms: Some(response_ms),
                    };
                    self.notify_transition(t, Some(&fetched), fetch, false)
                });
                CheckOutcome {
                    http_status: 200,
                    response: StatusResponse::success(fetched.payload),
                    notification,
                }
            }
            Err(err) => {
                tracing::warn!("Status check against {} failed: {}", url, err);
                let notification = self.observe(true).await.and_then(|t| {
                    let fetch = FetchMeta {
                        url: Some(url.to_string()),
                        http_status: match &err {
                            RelayError::Upstream { status } => Some(*status),
                            _ => None,
                        },
                        http_ok: Some(false),
                        error_message: Some(err.to_string()),
                        response_ms: Some(response_ms),
                    };
                    self.notify_transition(t, None, fetch, true)
                });
                CheckOutcome {
                    http_status: err.http_status(),
                    response: StatusResponse::failure(err.to_string()),
                    notification,
                }
            }
        }
    }

    async fn fetch(&self, url: &str) -> crate::Result<Fetched> {
        let bearer = self
            .upstream
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {}", t));

        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Cache-Control".to_string(), "no-store".to_string()),
        ];
        if let Some(bearer) = bearer {
            headers.push(("Authorization".to_string(), bearer));
        }

        let timeout = Duration::from_secs(self.upstream.timeout_seconds.max(1));
        let response = self.http.get(url, &headers, timeout).await?;

        if !response.is_success() {
            return Err(RelayError::Upstream {
                status: response.status,
            });
        }

        let (payload, raw) = BotStatusPayload::parse(&response.body)
            .map_err(|e| RelayError::Unreachable(format!("Invalid status payload: {}", e)))?;

        Ok(Fetched {
            http_status: response.status,
            payload,
            raw,
        })
    }

    /// Check-and-set of the outage state under the write lock
    async fn observe(&self, is_down: bool) -> Option<Transition> {
        let now = self.clock.now_unix();
        let transition = self.state.write().await.outage.observe(is_down, now);
        if let Some(t) = &transition {
            tracing::info!("{} status transition: {:?}", self.bot_name, t);
        }
        transition
    }

    fn notify_transition(
        &self,
        transition: Transition,
        fetched: Option<&Fetched>,
        fetch: FetchMeta,
        fetch_failed: bool,
    ) -> Option<JoinHandle<()>> {
        let bot = &self.bot_name;
        let (kind, event) = match transition {
            Transition::WentDown { since } => {
                let summary = if fetch_failed {
                    "status data could not be fetched".to_string()
                } else {
                    format!("{bot} api is offline or {bot} is offline")
                };
                (
                    NotificationKind::Offline,
                    NotificationEvent {
                        title: format!("{bot} offline"),
                        summary,
                        event_unix: since,
                        status: fetched.map(|f| f.payload.clone()),
                        raw: fetched.map(|f| f.raw.clone()),
                        fetch: Some(fetch),
                        outage: Some(OutageMeta {
                            down_since_unix: Some(since),
                            is_transition: Some(true),
                        }),
                    },
                )
            }
            Transition::CameUp {
                went_down_at,
                up_at,
            } => {
                let summary = match went_down_at {
                    Some(since) => format!(
                        "{bot} is back online after {}",
                        format_duration(up_at.saturating_sub(since))
                    ),
                    None => format!("{bot} is back online"),
                };
                (
                    NotificationKind::Online,
                    NotificationEvent {
                        title: format!("{bot} online"),
                        summary,
                        event_unix: up_at,
                        status: fetched.map(|f| f.payload.clone()),
                        raw: fetched.map(|f| f.raw.clone()),
                        fetch: Some(fetch),
                        outage: Some(OutageMeta {
                            down_since_unix: went_down_at,
                            is_transition: Some(true),
                        }),
                    },
                )
            }
        };

        let notification = Dispatch {
            kind,
            embeds: build_embeds(&event, &self.footer),
            timestamp_epoch_ms: self.clock.now_epoch_ms(),
        };
        dispatch(
            self.notifier.clone(),
            notification,
            Arc::clone(&self.state),
            &self.deliveries,
        )
    }
}

/// Compact human duration, e.g. `2d 3h 4m`, `1h 0m 5s`, `42s`
pub fn format_duration(seconds: i64) -> String {
    let total = seconds.max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
