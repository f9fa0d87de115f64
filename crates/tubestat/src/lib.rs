// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tubestat: YouTube channel analytics watcher.
//!
//! Links one YouTube channel through OAuth, polls its analytics on an
//! interval, and serves the projected metric entities over HTTP.

pub mod analytics;
pub mod auth;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod events;
pub mod state;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::analytics::validate_catalog;
use crate::channel::ChannelIdentity;
use crate::config::WatchConfig;
use crate::coordinator::Coordinator;
use crate::state::WatchState;
use crate::transport::build_router;

/// Run the tubestat server until shutdown.
pub async fn run(config: WatchConfig) -> anyhow::Result<()> {
    validate_catalog()?;

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    let state = Arc::new(WatchState::new(config, shutdown.clone()));

    restore_account(&state).await?;

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("tubestat listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}

/// Resume polling for a previously linked channel, if one is on disk.
///
/// Client credentials are never persisted, so a stored account without
/// them configured is a startup error rather than a silent un-link.
async fn restore_account(state: &Arc<WatchState>) -> anyhow::Result<()> {
    let Some(record) = state.store.load_account()? else {
        return Ok(());
    };

    let Ok(authority) = state.token_authority() else {
        anyhow::bail!(
            "persisted account found at {} but client credentials are not configured",
            state.store.account_path().display()
        );
    };

    let credential = record.to_credential();
    let identity = ChannelIdentity {
        id: credential.channel_id.clone(),
        title: credential.channel_title.clone(),
        kind: record.kind,
    };
    tracing::info!(channel = %identity.id, title = %identity.title, "restoring linked channel");

    let coordinator = Arc::new(Coordinator::new(
        identity,
        credential,
        authority,
        state.analytics_client(),
        state.store.clone(),
        state.hub.clone(),
        state.config.poll_interval_secs_clamped(),
        state.config.fetch_budget(),
        state.shutdown.child_token(),
    ));
    state.install_coordinator(coordinator).await;
    Ok(())
}
