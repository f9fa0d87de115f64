// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth token lifecycle for the linked YouTube account.
//!
//! Authorization URLs always carry `access_type=offline` and a forced
//! consent prompt. Without those parameters Google treats a re-link as a
//! silent re-approval and withholds the refresh token, which kills polling
//! at the first expiry.

pub mod authorize;
pub mod persist;
pub mod refresh;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Google authorization endpoint (browser redirect).
pub const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google token endpoint (code exchange and refresh).
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Read-only scopes required by the data and analytics queries.
pub const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/yt-analytics.readonly",
];

/// Refresh this many seconds before the recorded expiry.
pub const REFRESH_MARGIN_SECS: u64 = 300;

/// Fallback lifetime when a token response omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Standard OAuth2 token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenGrant {
    /// Absolute expiry for this grant, measured from now.
    pub fn expires_at(&self) -> u64 {
        let ttl = if self.expires_in == 0 { DEFAULT_TOKEN_TTL_SECS } else { self.expires_in };
        epoch_secs() + ttl
    }
}

/// Tokens plus identity for the linked channel.
#[derive(Debug, Clone)]
pub struct AccountCredential {
    pub channel_id: String,
    pub channel_title: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as epoch seconds.
    pub expires_at: u64,
}

impl AccountCredential {
    /// True when the token is expired or will expire within `margin` seconds.
    pub fn expires_within(&self, margin: u64) -> bool {
        self.expires_at <= epoch_secs().saturating_add(margin)
    }

    /// Apply a refresh grant. The refresh token is kept unless the endpoint
    /// rotated it; identity fields never change.
    pub fn rotated(&self, grant: &TokenGrant) -> Self {
        Self {
            channel_id: self.channel_id.clone(),
            channel_title: self.channel_title.clone(),
            access_token: grant.access_token.clone(),
            refresh_token: grant
                .refresh_token
                .clone()
                .unwrap_or_else(|| self.refresh_token.clone()),
            expires_at: grant.expires_at(),
        }
    }
}

/// Exchanges and refreshes tokens against one OAuth provider.
///
/// The exchange/refresh skeleton is fixed; only the authorization-URL step
/// deviates from a stock confidential-client flow (see [`authorize`]).
pub struct TokenAuthority {
    http: reqwest::Client,
    authorize_endpoint: String,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
}

impl TokenAuthority {
    pub fn new(
        authorize_endpoint: String,
        token_endpoint: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http, authorize_endpoint, token_endpoint, client_id, client_secret }
    }

    /// Build the URL the operator visits to (re-)link a channel.
    pub fn authorize_url(&self, redirect_uri: &str) -> String {
        authorize::build_authorize_url(
            &self.authorize_endpoint,
            &self.client_id,
            redirect_uri,
            OAUTH_SCOPES,
        )
    }

    /// Exchange an authorization code for a token grant.
    ///
    /// Fails when the grant carries no refresh token: that means the consent
    /// prompt was bypassed and the link would die at the first expiry.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, AuthError> {
        authorize::exchange_code(
            &self.http,
            &self.token_endpoint,
            &self.client_id,
            &self.client_secret,
            code,
            redirect_uri,
        )
        .await
    }

    /// Refresh an expiring credential, preserving identity fields.
    pub async fn refresh(&self, cred: &AccountCredential) -> Result<AccountCredential, AuthError> {
        let grant = refresh::refresh_grant(
            &self.http,
            &self.token_endpoint,
            &self.client_id,
            &self.client_secret,
            &cred.refresh_token,
        )
        .await?;
        Ok(cred.rotated(&grant))
    }
}

/// Return current epoch seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
