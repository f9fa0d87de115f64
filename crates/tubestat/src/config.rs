// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Slowest permitted poll cadence.
pub const MAX_POLL_INTERVAL_SECS: u64 = 43200;

/// Fastest permitted poll cadence; the analytics quotas punish anything
/// tighter.
pub const MIN_POLL_INTERVAL_SECS: u64 = 900;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

/// Wall-clock budget covering all fetches of one cycle.
pub const DEFAULT_FETCH_BUDGET_SECS: u64 = 30;

/// Clamp an operator-supplied poll interval into the permitted range.
pub fn clamp_interval_secs(secs: u64) -> u64 {
    secs.clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)
}

/// Configuration for the tubestat service.
#[derive(Debug, Clone, clap::Parser)]
pub struct WatchConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "TUBESTAT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9460, env = "TUBESTAT_PORT")]
    pub port: u16,

    /// Bearer token for API auth. If unset, auth is disabled.
    #[arg(long, env = "TUBESTAT_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// OAuth client id. Supplied each start, never written to disk.
    #[arg(long, env = "TUBESTAT_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret. Supplied each start, never written to disk.
    #[arg(long, env = "TUBESTAT_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// Poll interval in seconds, clamped to [900, 43200].
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS, env = "TUBESTAT_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: u64,

    /// Wall-clock budget for one cycle's fetches, in seconds.
    #[arg(long, default_value_t = DEFAULT_FETCH_BUDGET_SECS, env = "TUBESTAT_FETCH_BUDGET_SECS")]
    pub fetch_budget_secs: u64,

    /// Directory for persisted account state.
    #[arg(long, env = "TUBESTAT_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Override the OAuth authorization endpoint.
    #[arg(long, env = "TUBESTAT_AUTHORIZE_ENDPOINT")]
    pub authorize_endpoint: Option<String>,

    /// Override the OAuth token endpoint.
    #[arg(long, env = "TUBESTAT_TOKEN_ENDPOINT")]
    pub token_endpoint: Option<String>,

    /// Override the data API base URL.
    #[arg(long, env = "TUBESTAT_DATA_API_BASE")]
    pub data_api_base: Option<String>,

    /// Override the analytics API base URL.
    #[arg(long, env = "TUBESTAT_ANALYTICS_API_BASE")]
    pub analytics_api_base: Option<String>,
}

impl WatchConfig {
    pub fn poll_interval_secs_clamped(&self) -> u64 {
        clamp_interval_secs(self.poll_interval_secs)
    }

    pub fn fetch_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_budget_secs)
    }

    /// Resolve the state directory: explicit config, then
    /// `$XDG_STATE_HOME/tubestat`, then `$HOME/.local/state/tubestat`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return PathBuf::from(xdg).join("tubestat");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/state/tubestat");
        }
        PathBuf::from(".tubestat")
    }

    pub fn authorize_endpoint(&self) -> String {
        self.authorize_endpoint
            .clone()
            .unwrap_or_else(|| crate::auth::DEFAULT_AUTHORIZE_ENDPOINT.to_owned())
    }

    pub fn token_endpoint(&self) -> String {
        self.token_endpoint
            .clone()
            .unwrap_or_else(|| crate::auth::DEFAULT_TOKEN_ENDPOINT.to_owned())
    }

    pub fn data_api_base(&self) -> String {
        self.data_api_base.clone().unwrap_or_else(|| DEFAULT_DATA_API_BASE.to_owned())
    }

    pub fn analytics_api_base(&self) -> String {
        self.analytics_api_base.clone().unwrap_or_else(|| DEFAULT_ANALYTICS_API_BASE.to_owned())
    }
}

/// YouTube Data API v3.
pub const DEFAULT_DATA_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Analytics API v2.
pub const DEFAULT_ANALYTICS_API_BASE: &str = "https://youtubeanalytics.googleapis.com/v2";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
