//! Notifier trait and best-effort background delivery

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::embed::Embed;
use crate::state::StateHandle;

/// Which edge a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Offline,
    Online,
}

/// Record of a sent notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub title: String,
    pub kind: NotificationKind,
    pub pages: usize,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp_epoch_ms: u64,
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "discord")
    fn type_name(&self) -> &str;

    /// Deliver the notification pages
    async fn notify(&self, embeds: &[Embed]) -> crate::Result<()>;
}

/// A notification ready to be handed to a [`Notifier`]
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub kind: NotificationKind,
    pub embeds: Vec<Embed>,
    pub timestamp_epoch_ms: u64,
}

/// Deliver a notification on a background task tracked by `tasks`.
///
/// Without a notifier this is a no-op. Delivery failures are logged and
/// recorded in the history, never returned. Shutdown waits on `tasks` so
/// in-flight deliveries are not cut off.
pub fn dispatch(
    notifier: Option<Arc<dyn Notifier>>,
    notification: Dispatch,
    state: StateHandle,
    tasks: &TaskTracker,
) -> Option<JoinHandle<()>> {
    let Some(notifier) = notifier else {
        tracing::debug!(
            "No notification sink configured, dropping {:?} notification",
            notification.kind
        );
        return None;
    };

    Some(tasks.spawn(async move {
        let title = notification
            .embeds
            .first()
            .map(|e| e.title.clone())
            .unwrap_or_default();

        tracing::debug!(
            "Dispatching '{}' via '{}' ({} page(s))",
            title,
            notifier.type_name(),
            notification.embeds.len()
        );

        let result = notifier.notify(&notification.embeds).await;
        if let Err(e) = &result {
            tracing::warn!(
                "Notification '{}' via '{}' failed: {}",
                title,
                notifier.type_name(),
                e
            );
        }

        let record = NotificationRecord {
            title,
            kind: notification.kind,
            pages: notification.embeds.len(),
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            timestamp_epoch_ms: notification.timestamp_epoch_ms,
        };
        state.write().await.add_notification(record);
    }))
}
