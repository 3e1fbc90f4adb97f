//! Optional in-process polling so outages are noticed without page traffic

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::relay::StatusRelay;

/// Run `check_status` every `interval` until cancelled.
///
/// Returns the number of checks performed.
pub async fn poll_loop(
    relay: Arc<StatusRelay>,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut checks = 0;
    loop {
        let outcome = relay.check_status().await;
        checks += 1;
        tracing::debug!(
            "Background check #{}: HTTP {} ok={}",
            checks,
            outcome.http_status,
            outcome.response.ok
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Status polling cancelled after {} checks", checks);
                break;
            }
        }
    }
    checks
}
