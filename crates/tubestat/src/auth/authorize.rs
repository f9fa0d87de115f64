// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization-code flow: URL construction and code exchange.

use crate::auth::TokenGrant;
use crate::error::AuthError;

/// Build the full authorization URL.
///
/// `access_type=offline` requests a refresh token; `prompt=consent` forces
/// the consent screen even when a grant is already on file, because Google
/// omits the refresh token on silent re-approval; `include_granted_scopes=true`
/// carries previously granted scopes through a re-link.
pub fn build_authorize_url(
    authorize_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[&str],
) -> String {
    format!(
        "{authorize_endpoint}?client_id={client_id}\
         &redirect_uri={redirect_uri}\
         &response_type=code\
         &scope={scope}\
         &access_type=offline\
         &prompt=consent\
         &include_granted_scopes=true",
        client_id = urlencoding(client_id),
        redirect_uri = urlencoding(redirect_uri),
        scope = urlencoding(&scopes.join(" ")),
    )
}

/// Exchange an authorization code for tokens (form body, confidential client).
pub async fn exchange_code(
    client: &reqwest::Client,
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenGrant, AuthError> {
    let resp = client
        .post(token_endpoint)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await
        .map_err(|e| AuthError::Exchange { reason: e.to_string() })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::Exchange { reason: format!("http {status}: {body}") });
    }

    let grant: TokenGrant =
        resp.json().await.map_err(|e| AuthError::Exchange { reason: e.to_string() })?;

    // A grant without a refresh token cannot survive the first expiry.
    // Happens when the consent prompt was bypassed; the operator must
    // re-run the link flow.
    if grant.refresh_token.is_none() {
        return Err(AuthError::Exchange {
            reason: "no refresh token in grant (consent prompt was skipped)".to_owned(),
        });
    }

    Ok(grant)
}

/// Form-style encoding for URL query parameters (spaces as `+`).
fn urlencoding(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0xf) as usize]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[cfg(test)]
#[path = "authorize_tests.rs"]
mod tests;
