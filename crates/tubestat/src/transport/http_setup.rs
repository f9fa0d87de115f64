// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the channel setup flow.
//!
//! Setup is three steps: `authorize` hands the operator a consent URL,
//! `exchange` trades the returned code for tokens and lists the reachable
//! channels, `select` binds one channel and starts polling it.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::persist::PersistedAccount;
use crate::auth::AccountCredential;
use crate::channel::ChannelIdentity;
use crate::coordinator::Coordinator;
use crate::error::{AuthError, WatchError};
use crate::state::{PendingSetup, WatchState};

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub redirect_uri: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub authorize_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub channels: Vec<ChannelIdentity>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub channel: ChannelIdentity,
    pub linked: bool,
}

#[derive(Debug, Serialize)]
pub struct TeardownResponse {
    pub removed: bool,
}

// -- Handlers -----------------------------------------------------------------

/// `POST /api/v1/setup/authorize` — build the consent URL for the operator.
pub async fn authorize(
    State(s): State<Arc<WatchState>>,
    Json(req): Json<AuthorizeRequest>,
) -> impl IntoResponse {
    let authority = match s.token_authority() {
        Ok(a) => a,
        Err(code) => {
            return code.to_http_response("client credentials are not configured").into_response()
        }
    };
    Json(AuthorizeResponse { authorize_url: authority.authorize_url(&req.redirect_uri) })
        .into_response()
}

/// `POST /api/v1/setup/exchange` — trade the authorization code for tokens
/// and discover the channels they can reach.
pub async fn exchange(
    State(s): State<Arc<WatchState>>,
    Json(req): Json<ExchangeRequest>,
) -> impl IntoResponse {
    let authority = match s.token_authority() {
        Ok(a) => a,
        Err(code) => {
            return code.to_http_response("client credentials are not configured").into_response()
        }
    };

    let grant = match authority.exchange_code(&req.code, &req.redirect_uri).await {
        Ok(grant) => grant,
        Err(AuthError::Exchange { reason }) => {
            return WatchError::BadRequest
                .to_http_response(format!("code exchange rejected: {reason}"))
                .into_response()
        }
        Err(e) => {
            return WatchError::UpstreamError
                .to_http_response(format!("code exchange failed: {e}"))
                .into_response()
        }
    };
    let Some(refresh_token) = grant.refresh_token.clone() else {
        return WatchError::Internal
            .to_http_response("exchange returned no refresh token")
            .into_response();
    };

    let channels = match s.resolver().list_channels(&grant.access_token).await {
        Ok(channels) => channels,
        Err(e) => {
            return WatchError::UpstreamError
                .to_http_response(format!("channel discovery failed: {e}"))
                .into_response()
        }
    };

    let expires_at = grant.expires_at();
    *s.pending.write().await = Some(PendingSetup {
        access_token: grant.access_token,
        refresh_token,
        expires_at,
        channels: channels.clone(),
    });

    tracing::info!(count = channels.len(), "code exchanged, channels discovered");
    Json(ExchangeResponse { channels }).into_response()
}

/// `POST /api/v1/setup/select` — bind one channel and start polling.
///
/// The id normally comes from the exchange listing, but a manually entered
/// id is accepted if it resolves (discovery misses some brand channels).
pub async fn select(
    State(s): State<Arc<WatchState>>,
    Json(req): Json<SelectRequest>,
) -> impl IntoResponse {
    let Some(pending) = s.pending.read().await.clone() else {
        return WatchError::BadRequest.to_http_response("no exchange pending").into_response();
    };

    let identity = match pending.channels.iter().find(|c| c.id == req.channel_id) {
        Some(channel) => channel.clone(),
        None => {
            match s.resolver().lookup_channel(&pending.access_token, &req.channel_id).await {
                Ok(Some(identity)) => identity,
                Ok(None) => {
                    return WatchError::NotFound
                        .to_http_response(format!("channel {} not found", req.channel_id))
                        .into_response()
                }
                Err(e) => {
                    return WatchError::UpstreamError
                        .to_http_response(format!("channel lookup failed: {e}"))
                        .into_response()
                }
            }
        }
    };

    let authority = match s.token_authority() {
        Ok(a) => a,
        Err(code) => {
            return code.to_http_response("client credentials are not configured").into_response()
        }
    };

    let credential = AccountCredential {
        channel_id: identity.id.clone(),
        channel_title: identity.title.clone(),
        access_token: pending.access_token.clone(),
        refresh_token: pending.refresh_token.clone(),
        expires_at: pending.expires_at,
    };
    let record = PersistedAccount::from_credential(&credential, identity.kind);
    if let Err(e) = s.store.save_account(&record) {
        return WatchError::Internal
            .to_http_response(format!("failed to persist account: {e}"))
            .into_response();
    }

    let coordinator = Arc::new(Coordinator::new(
        identity.clone(),
        credential,
        authority,
        s.analytics_client(),
        s.store.clone(),
        s.hub.clone(),
        s.config.poll_interval_secs_clamped(),
        s.config.fetch_budget(),
        s.shutdown.child_token(),
    ));
    s.install_coordinator(coordinator).await;
    *s.pending.write().await = None;

    tracing::info!(channel = %identity.id, title = %identity.title, "channel linked");
    Json(SelectResponse { channel: identity, linked: true }).into_response()
}

/// `DELETE /api/v1/setup` — unlink the channel and forget its tokens.
pub async fn teardown(State(s): State<Arc<WatchState>>) -> impl IntoResponse {
    let had_coordinator = s.clear_coordinator().await;
    *s.pending.write().await = None;

    let removed_file = match s.store.clear_account() {
        Ok(removed) => removed,
        Err(e) => {
            return WatchError::Internal
                .to_http_response(format!("failed to clear account: {e}"))
                .into_response()
        }
    };

    tracing::info!(had_coordinator, removed_file, "setup cleared");
    Json(TeardownResponse { removed: had_coordinator || removed_file }).into_response()
}
