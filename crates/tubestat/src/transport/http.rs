// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the linked-channel surface.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::analytics::CATALOG;
use crate::channel::ChannelKind;
use crate::coordinator::PollState;
use crate::entity::{device_record, project, EntityState};
use crate::error::WatchError;
use crate::state::WatchState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub linked: bool,
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub channel: String,
    pub entities: Vec<EntityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub channel: String,
    pub title: String,
    pub kind: ChannelKind,
    pub state: PollState,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub interval_secs: u64,
    pub reauth_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct IntervalRequest {
    pub interval_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct IntervalResponse {
    pub interval_secs: u64,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<WatchState>>) -> impl IntoResponse {
    let linked = s.coordinator.read().await.is_some();
    Json(HealthResponse { status: "running".to_owned(), linked })
}

/// `GET /api/v1/device` — identity of the linked channel.
pub async fn device(State(s): State<Arc<WatchState>>) -> impl IntoResponse {
    let Some(coordinator) = s.coordinator.read().await.clone() else {
        return WatchError::SetupRequired.to_http_response("no channel linked").into_response();
    };
    Json(device_record(&coordinator.identity)).into_response()
}

/// `GET /api/v1/entities` — the full projected entity list.
///
/// While reauthentication is required the stale snapshot is withheld, so
/// every entity reads unavailable.
pub async fn entities(State(s): State<Arc<WatchState>>) -> impl IntoResponse {
    let Some(coordinator) = s.coordinator.read().await.clone() else {
        return WatchError::SetupRequired.to_http_response("no channel linked").into_response();
    };

    let status = coordinator.status().await;
    let snapshot = if status.state == PollState::FailedAuth {
        None
    } else {
        coordinator.snapshot().await
    };
    let fetched_at_ms = snapshot.as_ref().map(|snap| snap.fetched_at_ms);
    let entities = project(snapshot.as_ref(), CATALOG, &coordinator.identity);

    Json(EntitiesResponse { channel: coordinator.identity.id.clone(), entities, fetched_at_ms })
        .into_response()
}

/// `GET /api/v1/status` — poll loop status for the linked channel.
pub async fn status(State(s): State<Arc<WatchState>>) -> impl IntoResponse {
    let Some(coordinator) = s.coordinator.read().await.clone() else {
        return WatchError::SetupRequired.to_http_response("no channel linked").into_response();
    };

    let st = coordinator.status().await;
    Json(StatusResponse {
        channel: coordinator.identity.id.clone(),
        title: coordinator.identity.title.clone(),
        kind: coordinator.identity.kind,
        state: st.state,
        consecutive_failures: st.consecutive_failures,
        last_success_ms: st.last_success_ms,
        last_error: st.last_error,
        interval_secs: coordinator.interval_secs(),
        reauth_required: st.state == PollState::FailedAuth,
    })
    .into_response()
}

/// `POST /api/v1/interval` — update the poll interval at runtime.
pub async fn set_interval(
    State(s): State<Arc<WatchState>>,
    Json(req): Json<IntervalRequest>,
) -> impl IntoResponse {
    let Some(coordinator) = s.coordinator.read().await.clone() else {
        return WatchError::SetupRequired.to_http_response("no channel linked").into_response();
    };

    let applied = coordinator.set_interval(req.interval_secs);
    if applied != req.interval_secs {
        tracing::info!(requested = req.interval_secs, applied, "poll interval clamped");
    }
    Json(IntervalResponse { interval_secs: applied }).into_response()
}
