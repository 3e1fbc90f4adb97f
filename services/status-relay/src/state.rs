//! Outage tracking and notification history

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::notifier::NotificationRecord;

/// An observed edge between the up and down states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Up -> Down, the outage started at `since`
    WentDown { since: i64 },
    /// Down -> Up, the outage that started at `went_down_at` ended at `up_at`
    CameUp {
        went_down_at: Option<i64>,
        up_at: i64,
    },
}

/// Whether the bot was last seen down, and since when
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutageState {
    pub was_down: bool,
    pub down_since_unix: Option<i64>,
}

impl OutageState {
    /// Feed one observation into the up/down state machine.
    ///
    /// Returns the transition crossed, if any. Equal-state observations
    /// leave the state untouched.
    pub fn observe(&mut self, is_down: bool, now_unix: i64) -> Option<Transition> {
        match (self.was_down, is_down) {
            (false, true) => {
                self.was_down = true;
                self.down_since_unix = Some(now_unix);
                Some(Transition::WentDown { since: now_unix })
            }
            (true, false) => {
                let went_down_at = self.down_since_unix.take();
                self.was_down = false;
                Some(Transition::CameUp {
                    went_down_at,
                    up_at: now_unix,
                })
            }
            _ => None,
        }
    }
}

/// Shared state accessible by the relay, the poller and the HTTP API
#[derive(Debug)]
pub struct SharedState {
    pub outage: OutageState,
    pub history: VecDeque<NotificationRecord>,
    pub history_max_size: usize,
}

impl SharedState {
    pub fn new(history_max_size: usize) -> Self {
        Self {
            outage: OutageState::default(),
            history: VecDeque::with_capacity(history_max_size),
            history_max_size,
        }
    }

    /// Add a notification to history
    pub fn add_notification(&mut self, record: NotificationRecord) {
        if self.history_max_size == 0 {
            return;
        }
        if self.history.len() >= self.history_max_size {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(history_max_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(history_max_size)))
}
