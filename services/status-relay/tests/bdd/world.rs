//! BDD test world for the status relay

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cucumber::World;
use status_relay::clock::ManualClock;
use status_relay::config::Config;
use status_relay::embed::{Embed, NotificationEvent};
use status_relay::io::{HttpClient, HttpResponse};
use status_relay::notifier::Notifier;
use status_relay::relay::StatusRelay;
use status_relay::state::new_state_handle;
use status_relay::RelayError;

pub const UPSTREAM_URL: &str = "http://bot.internal/status";

/// What the fake upstream answers with
#[derive(Debug, Clone)]
pub enum UpstreamReply {
    Status { status: u16, body: String },
    Unreachable(String),
}

/// Upstream double whose reply can be changed between polls
#[derive(Debug)]
pub struct ScriptedUpstream {
    reply: Mutex<UpstreamReply>,
    calls: Mutex<u32>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(UpstreamReply::Status {
                status: 200,
                body: r#"{"online": true}"#.to_string(),
            }),
            calls: Mutex::new(0),
        }
    }

    pub fn set(&self, reply: UpstreamReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Default for ScriptedUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedUpstream {
    async fn get(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        _timeout: Duration,
    ) -> status_relay::Result<HttpResponse> {
        *self.calls.lock().unwrap() += 1;
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            UpstreamReply::Status { status, body } => Ok(HttpResponse { status, body }),
            UpstreamReply::Unreachable(msg) => Err(RelayError::Unreachable(msg)),
        }
    }

    async fn post_json(
        &self,
        _url: &str,
        _body: &serde_json::Value,
        _timeout: Duration,
    ) -> status_relay::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 204,
            body: String::new(),
        })
    }
}

/// Notifier double that records every delivery
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Vec<Embed>>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn type_name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, embeds: &[Embed]) -> status_relay::Result<()> {
        self.sent.lock().unwrap().push(embeds.to_vec());
        if self.fail {
            Err(RelayError::NotificationDelivery(
                "webhook returned status 500".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default, World)]
pub struct RelayWorld {
    pub config: Config,
    pub upstream: Option<Arc<ScriptedUpstream>>,
    pub notifier: Option<Arc<RecordingNotifier>>,
    pub clock: Option<Arc<ManualClock>>,
    pub relay: Option<Arc<StatusRelay>>,

    // Result of the last check or request
    pub last_status: Option<u16>,
    pub last_body: Option<serde_json::Value>,
    pub last_location: Option<String>,

    // Notification formatting
    pub event: Option<NotificationEvent>,
    pub embeds: Vec<Embed>,
}

impl RelayWorld {
    pub fn upstream(&mut self) -> Arc<ScriptedUpstream> {
        Arc::clone(
            self.upstream
                .get_or_insert_with(|| Arc::new(ScriptedUpstream::new())),
        )
    }

    pub fn clock(&mut self) -> Arc<ManualClock> {
        Arc::clone(
            self.clock
                .get_or_insert_with(|| Arc::new(ManualClock::new(1_700_000_000))),
        )
    }

    /// The relay under test, built on first use
    pub fn relay(&mut self) -> Arc<StatusRelay> {
        if let Some(relay) = &self.relay {
            return Arc::clone(relay);
        }
        let upstream = self.upstream();
        let clock = self.clock();
        let notifier = self
            .notifier
            .as_ref()
            .map(|n| Arc::clone(n) as Arc<dyn Notifier>);
        let relay = Arc::new(StatusRelay::new(
            &self.config,
            upstream,
            notifier,
            new_state_handle(self.config.relay.history_size),
            clock,
        ));
        self.relay = Some(Arc::clone(&relay));
        relay
    }

    pub fn sent(&self) -> Vec<Vec<Embed>> {
        self.notifier
            .as_ref()
            .map(|n| n.sent.lock().unwrap().clone())
            .unwrap_or_default()
    }

    pub fn sent_titled(&self, suffix: &str) -> Vec<Vec<Embed>> {
        self.sent()
            .into_iter()
            .filter(|pages| pages.first().is_some_and(|e| e.title.ends_with(suffix)))
            .collect()
    }
}
