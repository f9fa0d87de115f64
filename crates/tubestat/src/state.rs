// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::analytics::fetcher::AnalyticsClient;
use crate::auth::persist::StateStore;
use crate::auth::TokenAuthority;
use crate::channel::{ChannelIdentity, ChannelResolver};
use crate::config::WatchConfig;
use crate::coordinator::Coordinator;
use crate::error::WatchError;
use crate::events::EventHub;

/// Shared service state.
pub struct WatchState {
    pub config: WatchConfig,
    pub shutdown: CancellationToken,
    /// Event channel for coordinator notifications.
    pub hub: EventHub,
    pub store: StateStore,
    /// The active coordinator, if a channel is linked.
    pub coordinator: RwLock<Option<Arc<Coordinator>>>,
    /// An exchange that completed but has not been bound to a channel yet.
    pub pending: RwLock<Option<PendingSetup>>,
}

impl WatchState {
    pub fn new(config: WatchConfig, shutdown: CancellationToken) -> Self {
        let store = StateStore::new(config.state_dir());
        Self {
            config,
            shutdown,
            hub: EventHub::new(),
            store,
            coordinator: RwLock::new(None),
            pending: RwLock::new(None),
        }
    }

    /// Build a token authority from the configured client credentials.
    pub fn token_authority(&self) -> Result<TokenAuthority, WatchError> {
        let (Some(client_id), Some(client_secret)) =
            (self.config.client_id.clone(), self.config.client_secret.clone())
        else {
            return Err(WatchError::BadRequest);
        };
        Ok(TokenAuthority::new(
            self.config.authorize_endpoint(),
            self.config.token_endpoint(),
            client_id,
            client_secret,
        ))
    }

    pub fn resolver(&self) -> ChannelResolver {
        ChannelResolver::new(self.config.data_api_base())
    }

    pub fn analytics_client(&self) -> AnalyticsClient {
        AnalyticsClient::new(self.config.data_api_base(), self.config.analytics_api_base())
    }

    /// Install a coordinator and start its poll loop, cancelling any
    /// previous one first.
    pub async fn install_coordinator(&self, coordinator: Arc<Coordinator>) {
        let mut slot = self.coordinator.write().await;
        if let Some(old) = slot.take() {
            old.cancel.cancel();
        }
        coordinator.spawn_poll_loop();
        *slot = Some(coordinator);
    }

    /// Stop and drop the active coordinator. Returns whether one existed.
    pub async fn clear_coordinator(&self) -> bool {
        let mut slot = self.coordinator.write().await;
        match slot.take() {
            Some(old) => {
                old.cancel.cancel();
                true
            }
            None => false,
        }
    }
}

/// Tokens from a completed code exchange, held until the operator picks a
/// channel. The refresh token is unwrapped here so later steps never have
/// to re-check it.
#[derive(Debug, Clone)]
pub struct PendingSetup {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
    pub channels: Vec<ChannelIdentity>,
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
