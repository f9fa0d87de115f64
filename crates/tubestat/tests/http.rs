// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the tubestat HTTP API.
//!
//! Uses `axum_test::TestServer` — no real TCP needed. Endpoints that talk
//! to Google are covered separately against a fake upstream in `poll.rs`;
//! here the surface is exercised up to those calls.

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use tubestat::analytics::fetcher::AnalyticsClient;
use tubestat::auth::persist::{PersistedAccount, StateStore};
use tubestat::auth::{AccountCredential, TokenAuthority};
use tubestat::channel::{ChannelIdentity, ChannelKind};
use tubestat::config::WatchConfig;
use tubestat::coordinator::Coordinator;
use tubestat::state::WatchState;
use tubestat::transport::build_router;

fn test_config() -> WatchConfig {
    WatchConfig {
        host: "127.0.0.1".into(),
        port: 0,
        auth_token: None,
        client_id: Some("test-client".into()),
        client_secret: Some("test-secret".into()),
        poll_interval_secs: 3600,
        fetch_budget_secs: 30,
        state_dir: Some(std::env::temp_dir().join(format!("tubestat-test-{}", std::process::id()))),
        authorize_endpoint: None,
        token_endpoint: None,
        data_api_base: None,
        analytics_api_base: None,
    }
}

fn test_state(config: WatchConfig) -> Arc<WatchState> {
    // reqwest is built without a default TLS provider; install ring for
    // the whole process before any client is constructed.
    let _ = rustls::crypto::ring::default_provider().install_default();
    Arc::new(WatchState::new(config, CancellationToken::new()))
}

fn test_server(state: Arc<WatchState>) -> TestServer {
    let router = build_router(state);
    TestServer::new(router).expect("failed to create test server")
}

/// Insert a coordinator directly without starting its poll loop, so the
/// surface can be asserted deterministically.
async fn insert_coordinator(state: &Arc<WatchState>) -> Arc<Coordinator> {
    let identity = ChannelIdentity {
        id: "UCfixture".to_owned(),
        title: "Fixture Channel".to_owned(),
        kind: ChannelKind::Owned,
    };
    let credential = AccountCredential {
        channel_id: identity.id.clone(),
        channel_title: identity.title.clone(),
        access_token: "at".to_owned(),
        refresh_token: "rt".to_owned(),
        expires_at: tubestat::auth::epoch_secs() + 3600,
    };
    let coordinator = Arc::new(Coordinator::new(
        identity,
        credential,
        TokenAuthority::new(
            "http://127.0.0.1:1/auth".to_owned(),
            "http://127.0.0.1:1/token".to_owned(),
            "test-client".to_owned(),
            "test-secret".to_owned(),
        ),
        AnalyticsClient::new(
            "http://127.0.0.1:1/data".to_owned(),
            "http://127.0.0.1:1/analytics".to_owned(),
        ),
        state.store.clone(),
        state.hub.clone(),
        3600,
        Duration::from_secs(30),
        CancellationToken::new(),
    ));
    *state.coordinator.write().await = Some(Arc::clone(&coordinator));
    coordinator
}

// -- Health and auth ----------------------------------------------------------

#[tokio::test]
async fn health_is_open_without_bearer() -> anyhow::Result<()> {
    let mut config = test_config();
    config.auth_token = Some("sekrit".into());
    let server = test_server(test_state(config));

    let resp = server.get("/api/v1/health").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["linked"], false);
    Ok(())
}

#[tokio::test]
async fn bearer_is_enforced_on_api_routes() -> anyhow::Result<()> {
    let mut config = test_config();
    config.auth_token = Some("sekrit".into());
    let server = test_server(test_state(config));

    let resp = server.get("/api/v1/status").await;
    resp.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = server
        .get("/api/v1/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer wrong"),
        )
        .await;
    resp.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    // Correct token gets past auth; with nothing linked the endpoint
    // answers 409 instead.
    let resp = server
        .get("/api/v1/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Bearer sekrit"),
        )
        .await;
    resp.assert_status(axum::http::StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn no_token_configured_disables_auth() -> anyhow::Result<()> {
    let server = test_server(test_state(test_config()));
    let resp = server.get("/api/v1/status").await;
    resp.assert_status(axum::http::StatusCode::CONFLICT);
    Ok(())
}

// -- Unlinked surface ---------------------------------------------------------

#[tokio::test]
async fn surface_requires_setup() -> anyhow::Result<()> {
    let server = test_server(test_state(test_config()));

    for path in ["/api/v1/device", "/api/v1/entities", "/api/v1/status"] {
        let resp = server.get(path).await;
        resp.assert_status(axum::http::StatusCode::CONFLICT);
        let body: serde_json::Value = resp.json();
        assert_eq!(body["error"]["code"], "SETUP_REQUIRED");
    }

    let resp = server
        .post("/api/v1/interval")
        .json(&serde_json::json!({ "interval_secs": 1800 }))
        .await;
    resp.assert_status(axum::http::StatusCode::CONFLICT);
    Ok(())
}

// -- Setup flow ---------------------------------------------------------------

#[tokio::test]
async fn authorize_url_carries_forced_consent() -> anyhow::Result<()> {
    let server = test_server(test_state(test_config()));

    let resp = server
        .post("/api/v1/setup/authorize")
        .json(&serde_json::json!({ "redirect_uri": "https://example.net/callback" }))
        .await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    let url = body["authorize_url"].as_str().expect("authorize_url");
    assert!(url.contains("access_type=offline"));
    assert!(url.contains("prompt=consent"));
    assert!(url.contains("include_granted_scopes=true"));
    assert!(url.contains("client_id=test-client"));
    assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.net%2Fcallback"));
    Ok(())
}

#[tokio::test]
async fn authorize_without_client_credentials_is_rejected() -> anyhow::Result<()> {
    let mut config = test_config();
    config.client_id = None;
    config.client_secret = None;
    let server = test_server(test_state(config));

    let resp = server
        .post("/api/v1/setup/authorize")
        .json(&serde_json::json!({ "redirect_uri": "https://example.net/callback" }))
        .await;
    resp.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn select_without_pending_exchange_is_rejected() -> anyhow::Result<()> {
    let server = test_server(test_state(test_config()));

    let resp = server
        .post("/api/v1/setup/select")
        .json(&serde_json::json!({ "channel_id": "UCanything" }))
        .await;
    resp.assert_status(axum::http::StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn teardown_with_nothing_linked_reports_nothing_removed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = test_config();
    config.state_dir = Some(dir.path().to_path_buf());
    let server = test_server(test_state(config));

    let resp = server.delete("/api/v1/setup").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["removed"], false);
    Ok(())
}

#[tokio::test]
async fn teardown_forgets_persisted_account() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = test_config();
    config.state_dir = Some(dir.path().to_path_buf());
    let state = test_state(config);

    let credential = AccountCredential {
        channel_id: "UCgone".to_owned(),
        channel_title: "Soon Gone".to_owned(),
        access_token: "at".to_owned(),
        refresh_token: "rt".to_owned(),
        expires_at: tubestat::auth::epoch_secs() + 3600,
    };
    state.store.save_account(&PersistedAccount::from_credential(&credential, ChannelKind::Owned))?;

    let server = test_server(Arc::clone(&state));
    let resp = server.delete("/api/v1/setup").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["removed"], true);

    let store = StateStore::new(dir.path().to_path_buf());
    assert!(store.load_account()?.is_none());
    Ok(())
}

// -- Linked surface -----------------------------------------------------------

#[tokio::test]
async fn device_reports_channel_identity() -> anyhow::Result<()> {
    let state = test_state(test_config());
    insert_coordinator(&state).await;
    let server = test_server(state);

    let resp = server.get("/api/v1/device").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["channel_id"], "UCfixture");
    assert_eq!(body["channel_title"], "Fixture Channel");
    assert_eq!(body["manufacturer"], "YouTube");
    assert_eq!(body["model"], "YouTube Channel");
    Ok(())
}

#[tokio::test]
async fn entities_are_unavailable_before_first_fetch() -> anyhow::Result<()> {
    let state = test_state(test_config());
    insert_coordinator(&state).await;
    let server = test_server(state);

    let resp = server.get("/api/v1/entities").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["channel"], "UCfixture");
    let entities = body["entities"].as_array().expect("entities array");
    assert!(!entities.is_empty());
    for entity in entities {
        assert_eq!(entity["available"], false);
        assert!(entity.get("value").is_none());
    }
    assert!(body.get("fetched_at_ms").is_none());
    Ok(())
}

#[tokio::test]
async fn status_reports_idle_before_first_cycle() -> anyhow::Result<()> {
    let state = test_state(test_config());
    insert_coordinator(&state).await;
    let server = test_server(state);

    let resp = server.get("/api/v1/status").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["channel"], "UCfixture");
    assert_eq!(body["state"], "idle");
    assert_eq!(body["consecutive_failures"], 0);
    assert_eq!(body["interval_secs"], 3600);
    assert_eq!(body["reauth_required"], false);
    Ok(())
}

#[tokio::test]
async fn interval_update_is_clamped() -> anyhow::Result<()> {
    let state = test_state(test_config());
    let coordinator = insert_coordinator(&state).await;
    let server = test_server(state);

    let resp = server
        .post("/api/v1/interval")
        .json(&serde_json::json!({ "interval_secs": 60 }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["interval_secs"], 900);
    assert_eq!(coordinator.interval_secs(), 900);

    let resp = server
        .post("/api/v1/interval")
        .json(&serde_json::json!({ "interval_secs": 86400 }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["interval_secs"], 43200);
    Ok(())
}
