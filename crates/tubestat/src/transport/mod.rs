// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the tubestat service.

pub mod auth;
pub mod http;
pub mod http_setup;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::WatchState;

/// Build the axum `Router` with all service routes.
pub fn build_router(state: Arc<WatchState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(http::health))
        // Linked channel surface
        .route("/api/v1/device", get(http::device))
        .route("/api/v1/entities", get(http::entities))
        .route("/api/v1/status", get(http::status))
        .route("/api/v1/interval", post(http::set_interval))
        // Setup flow
        .route("/api/v1/setup/authorize", post(http_setup::authorize))
        .route("/api/v1/setup/exchange", post(http_setup::exchange))
        .route("/api/v1/setup/select", post(http_setup::select))
        .route("/api/v1/setup", delete(http_setup::teardown))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
