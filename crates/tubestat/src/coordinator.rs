// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling coordinator: periodically refreshes credentials, fetches the
//! metric snapshot, and fans out events.
//!
//! One coordinator serves one linked channel. A cycle that loses
//! authorization parks the loop until a fresh setup replaces the whole
//! coordinator; transient failures keep the previous snapshot and retry on
//! the next tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;

use crate::analytics::fetcher::AnalyticsClient;
use crate::analytics::{merge_snapshot, missing_keys, MetricSnapshot, WINDOW_DAYS};
use crate::auth::persist::{PersistedAccount, StateStore};
use crate::auth::{AccountCredential, TokenAuthority, REFRESH_MARGIN_SECS};
use crate::channel::ChannelIdentity;
use crate::config::clamp_interval_secs;
use crate::error::AuthError;
use crate::events::{EventHub, WatchEvent};

// -- Status ------------------------------------------------------------------

/// Lifecycle state of the poll loop, as reported over the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    #[default]
    Idle,
    Fetching,
    Succeeded,
    FailedTransient,
    FailedAuth,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PollStatus {
    pub state: PollState,
    pub consecutive_failures: u32,
    pub last_success_ms: Option<u64>,
    pub last_error: Option<String>,
}

/// How a single cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Success,
    Transient,
    Auth,
}

// -- Coordinator -------------------------------------------------------------

pub struct Coordinator {
    pub identity: ChannelIdentity,
    pub cancel: CancellationToken,
    authority: TokenAuthority,
    analytics: AnalyticsClient,
    store: StateStore,
    hub: EventHub,
    credential: RwLock<AccountCredential>,
    snapshot: RwLock<Option<MetricSnapshot>>,
    status: RwLock<PollStatus>,
    interval_secs: AtomicU64,
    interval_changed: Notify,
    budget: Duration,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: ChannelIdentity,
        credential: AccountCredential,
        authority: TokenAuthority,
        analytics: AnalyticsClient,
        store: StateStore,
        hub: EventHub,
        interval_secs: u64,
        budget: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            identity,
            cancel,
            authority,
            analytics,
            store,
            hub,
            credential: RwLock::new(credential),
            snapshot: RwLock::new(None),
            status: RwLock::new(PollStatus::default()),
            interval_secs: AtomicU64::new(clamp_interval_secs(interval_secs)),
            interval_changed: Notify::new(),
            budget,
        }
    }

    pub async fn snapshot(&self) -> Option<MetricSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn status(&self) -> PollStatus {
        self.status.read().await.clone()
    }

    pub async fn credential(&self) -> AccountCredential {
        self.credential.read().await.clone()
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs.load(Ordering::Relaxed)
    }

    /// Update the poll interval, clamped to the permitted range. Takes
    /// effect immediately: a sleeping loop restarts its timer.
    pub fn set_interval(&self, secs: u64) -> u64 {
        let clamped = clamp_interval_secs(secs);
        self.interval_secs.store(clamped, Ordering::Relaxed);
        self.interval_changed.notify_one();
        clamped
    }

    /// Run one full poll cycle: refresh the credential if it is close to
    /// expiry, fetch all metric groups under the wall-clock budget, then
    /// publish the merged snapshot.
    pub async fn run_cycle(&self) -> CycleOutcome {
        {
            let mut status = self.status.write().await;
            status.state = PollState::Fetching;
        }

        // Refresh ahead of expiry so fetches never run with a token that
        // could lapse mid-cycle.
        let mut credential = self.credential.read().await.clone();
        if credential.expires_within(REFRESH_MARGIN_SECS) {
            match self.authority.refresh(&credential).await {
                Ok(rotated) => {
                    let record = PersistedAccount::from_credential(&rotated, self.identity.kind);
                    if let Err(e) = self.store.save_account(&record) {
                        tracing::warn!(channel = %self.identity.id, err = %e, "failed to persist rotated credential");
                    }
                    *self.credential.write().await = rotated.clone();
                    credential = rotated;
                    tracing::debug!(channel = %self.identity.id, "access token refreshed");
                }
                Err(AuthError::Refresh { reason }) => {
                    // The grant itself was rejected. Only a new consent
                    // flow can recover.
                    self.fail_auth(format!("token refresh rejected: {reason}")).await;
                    return CycleOutcome::Auth;
                }
                Err(e) => {
                    // Could not reach the token endpoint. The grant may
                    // still be fine, so retry next tick.
                    self.fail_transient(format!("token refresh unavailable: {e}")).await;
                    return CycleOutcome::Transient;
                }
            }
        }

        let fetches = self.fetch_all(&credential.access_token);
        let snapshot = match tokio::time::timeout(self.budget, fetches).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(err)) if err.is_unauthorized() => {
                self.fail_auth(err.to_string()).await;
                return CycleOutcome::Auth;
            }
            Ok(Err(err)) => {
                self.fail_transient(err.to_string()).await;
                return CycleOutcome::Transient;
            }
            Err(_) => {
                self.fail_transient(format!("fetch exceeded the {:?} budget", self.budget)).await;
                return CycleOutcome::Transient;
            }
        };

        let missing = missing_keys(&snapshot);
        if !missing.is_empty() {
            self.fail_transient(format!("response missing metrics: {}", missing.join(", ")))
                .await;
            return CycleOutcome::Transient;
        }

        let fetched_at_ms = snapshot.fetched_at_ms;
        let metric_count = snapshot.values.len();
        *self.snapshot.write().await = Some(snapshot);
        {
            let mut status = self.status.write().await;
            status.state = PollState::Succeeded;
            status.consecutive_failures = 0;
            status.last_success_ms = Some(fetched_at_ms);
            status.last_error = None;
        }
        // Every completed cycle notifies, even when no value changed.
        self.hub.send(WatchEvent::Snapshot {
            channel: self.identity.id.clone(),
            fetched_at_ms,
            metric_count,
        });
        tracing::info!(channel = %self.identity.id, metrics = metric_count, "metrics refreshed");
        CycleOutcome::Success
    }

    /// Fetch all metric groups sequentially and merge them into one
    /// snapshot. Any group failing fails the whole cycle.
    async fn fetch_all(&self, access_token: &str) -> Result<MetricSnapshot, crate::error::ApiError> {
        let windowed = self
            .analytics
            .fetch_windowed(access_token, &self.identity.id, WINDOW_DAYS)
            .await?;
        let lifetime = self.analytics.fetch_lifetime(access_token, &self.identity.id).await?;
        let recent = self.analytics.fetch_recent_uploads(access_token, &self.identity.id).await?;
        Ok(merge_snapshot(vec![windowed, lifetime, recent]))
    }

    async fn fail_transient(&self, reason: String) {
        let failures = {
            let mut status = self.status.write().await;
            status.state = PollState::FailedTransient;
            status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            status.last_error = Some(reason.clone());
            status.consecutive_failures
        };
        tracing::warn!(channel = %self.identity.id, err = %reason, failures, "metrics update failed");
        self.hub.send(WatchEvent::UpdateFailed {
            channel: self.identity.id.clone(),
            error: reason,
            consecutive_failures: failures,
        });
    }

    async fn fail_auth(&self, reason: String) {
        {
            let mut status = self.status.write().await;
            status.state = PollState::FailedAuth;
            status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            status.last_error = Some(reason.clone());
        }
        tracing::warn!(channel = %self.identity.id, err = %reason, "authorization lost, reauthentication required");
        self.hub.send(WatchEvent::ReauthRequired {
            channel: self.identity.id.clone(),
            error: reason,
        });
    }

    /// Spawn the poll loop. Runs one cycle immediately, then sleeps the
    /// configured interval between cycles until cancelled or authorization
    /// is lost.
    pub fn spawn_poll_loop(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let outcome = tokio::select! {
                    _ = coordinator.cancel.cancelled() => break,
                    outcome = coordinator.run_cycle() => outcome,
                };
                if outcome == CycleOutcome::Auth {
                    // Nothing this loop does can restore consent. Park
                    // until a new setup replaces the coordinator.
                    break;
                }

                // Sleep until the next cycle, restarting the timer when
                // the interval changes.
                loop {
                    let interval = Duration::from_secs(coordinator.interval_secs());
                    tokio::select! {
                        _ = coordinator.cancel.cancelled() => return,
                        _ = coordinator.interval_changed.notified() => continue,
                        _ = tokio::time::sleep(interval) => {}
                    }
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
