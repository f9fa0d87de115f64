// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll-cycle events fanned out to subscribers.
//!
//! Events carry outcomes, not metric payloads: subscribers re-read the
//! coordinator-held snapshot on notification. A `snapshot` event is sent on
//! every successful merge, including value-identical ones, because
//! consumers key freshness off notification rather than value diffing.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the polling coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchEvent {
    /// A poll cycle merged a fresh snapshot.
    Snapshot { channel: String, fetched_at_ms: u64, metric_count: usize },
    /// A poll cycle failed transiently; the previous snapshot still stands.
    UpdateFailed { channel: String, error: String, consecutive_failures: u32 },
    /// The credential was rejected; polling stops until the operator
    /// re-links the account.
    ReauthRequired { channel: String, error: String },
}

impl WatchEvent {
    /// Return the channel id this event belongs to.
    pub fn channel(&self) -> &str {
        match self {
            Self::Snapshot { channel, .. }
            | Self::UpdateFailed { channel, .. }
            | Self::ReauthRequired { channel, .. } => channel,
        }
    }
}

/// Event hub fanning out coordinator events via broadcast.
#[derive(Clone)]
pub struct EventHub {
    pub event_tx: broadcast::Sender<WatchEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self { event_tx }
    }

    /// Subscribe to coordinator events.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.event_tx.subscribe()
    }

    /// Send an event, ignoring the no-subscriber case.
    pub fn send(&self, event: WatchEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
