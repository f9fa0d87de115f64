// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth token refresh with rejection/outage classification.

use crate::auth::TokenGrant;
use crate::error::AuthError;

/// Perform a single token refresh request.
///
/// A 4xx answer (`invalid_grant` and friends) means the refresh token is
/// dead and only a re-link helps; anything else is an outage and the
/// caller retries on its next cycle.
pub async fn refresh_grant(
    client: &reqwest::Client,
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenGrant, AuthError> {
    let resp = client
        .post(token_endpoint)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let reason = format!("http {status}: {body}");
        if status.is_client_error() {
            return Err(AuthError::Refresh { reason });
        }
        return Err(AuthError::Unavailable { reason });
    }

    let grant: TokenGrant =
        resp.json().await.map_err(|e| AuthError::Unavailable { reason: e.to_string() })?;
    Ok(grant)
}
