// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy: token lifecycle, analytics reads, and the HTTP envelope.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from the OAuth token lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint rejected an authorization-code exchange (setup time).
    /// The operator retries the link flow.
    #[error("code exchange rejected: {reason}")]
    Exchange { reason: String },

    /// The token endpoint rejected the refresh token (revoked or expired).
    /// Polling stops until the operator re-links the account.
    #[error("refresh token rejected: {reason}")]
    Refresh { reason: String },

    /// The token endpoint could not be reached or answered with a server
    /// error. Retried on the next cycle, never escalated to reauth.
    #[error("token endpoint unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Unavailable { reason: e.to_string() }
    }
}

/// Errors from the analytics read APIs, classified by recoverability.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401/403. The token was valid moments ago but the server now rejects
    /// it; treated as revoked, not transient.
    #[error("api request unauthorized (http {status})")]
    Unauthorized { status: u16 },

    /// Server errors, rate limiting, timeouts, transport failures, empty
    /// result sets. The previous snapshot stays visible and the next tick
    /// retries.
    #[error("transient api failure: {reason}")]
    Transient { reason: String },
}

impl ApiError {
    /// Classify a non-success HTTP status from a read endpoint.
    pub fn from_status(status: StatusCode, context: &str, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Self::Unauthorized { status: status.as_u16() }
        } else {
            Self::Transient { reason: format!("{context} failed (http {status}): {body}") }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transient { reason: e.to_string() }
    }
}

/// Metric catalog inconsistency. A defect in the static definitions, checked
/// at startup so it can never surface as a runtime fetch failure.
#[derive(Debug, thiserror::Error)]
#[error("metric catalog misconfigured: {0}")]
pub struct ConfigurationError(pub String);

/// Error codes for the tubestat API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchError {
    Unauthorized,
    BadRequest,
    NotFound,
    SetupRequired,
    UpstreamError,
    Internal,
}

impl WatchError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::SetupRequired => 409,
            Self::UpstreamError => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::SetupRequired => "SETUP_REQUIRED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
