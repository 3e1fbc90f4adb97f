//! BDD step definitions for outage transitions

use std::sync::Arc;

use cucumber::{given, then, when};

use crate::world::{RecordingNotifier, RelayWorld, UpstreamReply, UPSTREAM_URL};

#[given("the upstream status URL is configured")]
fn upstream_configured(world: &mut RelayWorld) {
    world.config.upstream.url = Some(UPSTREAM_URL.to_string());
}

#[given("the upstream status URL is not configured")]
fn upstream_not_configured(world: &mut RelayWorld) {
    world.config.upstream.url = None;
}

#[given("a notification sink is configured")]
fn sink_configured(world: &mut RelayWorld) {
    world.notifier = Some(Arc::new(RecordingNotifier::default()));
}

#[given("a notification sink that rejects every delivery")]
fn failing_sink(world: &mut RelayWorld) {
    world.notifier = Some(Arc::new(RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    }));
}

#[given(expr = "the clock reads {int}")]
fn clock_reads(world: &mut RelayWorld, now: i64) {
    world.clock().set(now);
}

#[when(expr = "the clock advances {int} seconds")]
fn clock_advances(world: &mut RelayWorld, seconds: i64) {
    world.clock().advance(seconds);
}

#[given("the upstream reports the bot online")]
fn upstream_online(world: &mut RelayWorld) {
    world.upstream().set(UpstreamReply::Status {
        status: 200,
        body: r#"{"online": true, "uptime_seconds": 10, "shards": [{"id": 0, "online": true, "latency_ms": 40}]}"#
            .to_string(),
    });
}

#[given("the upstream reports the bot offline")]
fn upstream_offline(world: &mut RelayWorld) {
    world.upstream().set(UpstreamReply::Status {
        status: 200,
        body: r#"{"online": false, "shards": []}"#.to_string(),
    });
}

#[given(expr = "the upstream responds with HTTP {int}")]
fn upstream_http_status(world: &mut RelayWorld, status: u16) {
    world.upstream().set(UpstreamReply::Status {
        status,
        body: "upstream error".to_string(),
    });
}

#[given("the upstream is unreachable")]
fn upstream_unreachable(world: &mut RelayWorld) {
    world.upstream().set(UpstreamReply::Unreachable(format!(
        "GET {} failed: connection refused",
        UPSTREAM_URL
    )));
}

#[when("the status is checked")]
async fn status_checked(world: &mut RelayWorld) {
    let relay = world.relay();
    let mut outcome = relay.check_status().await;
    if let Some(handle) = outcome.notification.take() {
        handle.await.expect("notification task panicked");
    }
    world.last_status = Some(outcome.http_status);
    world.last_body = Some(serde_json::to_value(&outcome.response).unwrap());
}

#[when(expr = "the status is checked against the sequence {string}")]
async fn status_sequence(world: &mut RelayWorld, sequence: String) {
    for step in sequence.split(',').map(str::trim) {
        match step {
            "up" => upstream_online(world),
            "down" => upstream_offline(world),
            "error" => upstream_http_status(world, 503),
            other => panic!("Unknown poll result: {}", other),
        }
        world.clock().advance(10);
        status_checked(world).await;
    }
}

#[then(expr = "the check answers with HTTP {int}")]
fn check_answers(world: &mut RelayWorld, status: u16) {
    assert_eq!(world.last_status, Some(status));
}

#[then(expr = "{int} offline notification(s) has/have been sent")]
fn offline_sent(world: &mut RelayWorld, count: usize) {
    let sent = world.sent_titled(" offline");
    assert_eq!(sent.len(), count, "offline notifications: {:?}", sent);
}

#[then(expr = "{int} online notification(s) has/have been sent")]
fn online_sent(world: &mut RelayWorld, count: usize) {
    let sent = world.sent_titled(" online");
    assert_eq!(sent.len(), count, "online notifications: {:?}", sent);
}

#[then("no notification has been sent")]
fn none_sent(world: &mut RelayWorld) {
    assert!(world.sent().is_empty(), "sent: {:?}", world.sent());
}

#[then(expr = "the last notification field {string} contains {string}")]
fn last_field_contains(world: &mut RelayWorld, name: String, expected: String) {
    let sent = world.sent();
    let pages = sent.last().expect("no notification sent");
    let field = pages
        .iter()
        .find_map(|p| p.field(&name))
        .unwrap_or_else(|| panic!("field '{}' missing", name));
    assert!(
        field.value.contains(&expected),
        "Expected '{}' to contain '{}', got '{}'",
        name,
        expected,
        field.value
    );
}

#[then(expr = "the last notification summary is {string}")]
fn last_summary(world: &mut RelayWorld, expected: String) {
    let sent = world.sent();
    let pages = sent.last().expect("no notification sent");
    assert_eq!(pages[0].description.as_deref(), Some(expected.as_str()));
}

#[then("the relay remembers the bot as down")]
async fn remembers_down(world: &mut RelayWorld) {
    let relay = world.relay();
    let state = relay.state().read().await;
    assert!(state.outage.was_down);
    assert!(state.outage.down_since_unix.is_some());
}

#[then("the relay remembers the bot as up")]
async fn remembers_up(world: &mut RelayWorld) {
    let relay = world.relay();
    let state = relay.state().read().await;
    assert!(!state.outage.was_down);
    assert_eq!(state.outage.down_since_unix, None);
}

#[then(expr = "the notification history holds {int} failed delivery/deliveries")]
async fn failed_history(world: &mut RelayWorld, count: usize) {
    let relay = world.relay();
    let state = relay.state().read().await;
    let failed = state.history.iter().filter(|r| !r.success).count();
    assert_eq!(failed, count);
}

#[then("the upstream was not contacted")]
fn upstream_not_contacted(world: &mut RelayWorld) {
    assert_eq!(world.upstream().calls(), 0);
}

#[when("the upstream reports the bot online")]
fn upstream_online_now(world: &mut RelayWorld) {
    upstream_online(world);
}

#[when("the upstream reports the bot offline")]
fn upstream_offline_now(world: &mut RelayWorld) {
    upstream_offline(world);
}

#[when("the upstream is unreachable")]
fn upstream_unreachable_now(world: &mut RelayWorld) {
    upstream_unreachable(world);
}

#[when(expr = "the upstream responds with HTTP {int}")]
fn upstream_http_status_now(world: &mut RelayWorld, status: u16) {
    upstream_http_status(world, status);
}
