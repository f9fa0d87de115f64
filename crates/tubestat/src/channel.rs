// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel discovery: owned and managed-by-me listings, merged.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// How the authenticated identity relates to a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Owned,
    /// Managed on behalf of another owner (brand account).
    Managed,
}

/// A channel visible to the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelIdentity {
    pub id: String,
    pub title: String,
    pub kind: ChannelKind,
}

/// Read client for the channel listing endpoints.
pub struct ChannelResolver {
    http: Client,
    data_base: String,
}

impl ChannelResolver {
    pub fn new(data_base: String) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http, data_base }
    }

    /// List channels reachable with this token: the identity's own channel
    /// plus brand channels it manages, de-duplicated by id.
    ///
    /// The two queries fail independently; a partial union is returned as
    /// long as either succeeds.
    pub async fn list_channels(&self, access_token: &str) -> Result<Vec<ChannelIdentity>, ApiError> {
        let owned = self.list(access_token, "mine", ChannelKind::Owned).await;
        let managed = self.list(access_token, "managedByMe", ChannelKind::Managed).await;

        let (owned, managed) = match (owned, managed) {
            (Err(oe), Err(me)) => {
                tracing::warn!(err = %me, "managed-channel query failed");
                return Err(oe);
            }
            (Ok(o), Err(me)) => {
                tracing::warn!(err = %me, "managed-channel query failed, continuing with owned results");
                (o, Vec::new())
            }
            (Err(oe), Ok(m)) => {
                tracing::warn!(err = %oe, "owned-channel query failed, continuing with managed results");
                (Vec::new(), m)
            }
            (Ok(o), Ok(m)) => (o, m),
        };

        Ok(merge_channel_lists(owned, managed))
    }

    /// Validate a manually entered channel id and fetch its title.
    ///
    /// `managedByMe` is unreliable for some brand channels, so setup accepts
    /// ids that discovery never returned. The by-id lookup only proves the
    /// channel exists; analytics access is proven by the first poll cycle.
    pub async fn lookup_channel(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelIdentity>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/channels", self.data_base))
            .query(&[("part", "snippet"), ("id", channel_id)])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, "channel lookup", &body));
        }

        let value: serde_json::Value = resp.json().await?;
        Ok(parse_channel_items(&value, ChannelKind::Managed).into_iter().next())
    }

    async fn list(
        &self,
        access_token: &str,
        filter: &str,
        kind: ChannelKind,
    ) -> Result<Vec<ChannelIdentity>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/channels", self.data_base))
            .query(&[("part", "snippet"), (filter, "true")])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, "channel listing", &body));
        }

        let value: serde_json::Value = resp.json().await?;
        Ok(parse_channel_items(&value, kind))
    }
}

/// Extract channel identities from a `channels.list` response body.
fn parse_channel_items(value: &serde_json::Value, kind: ChannelKind) -> Vec<ChannelIdentity> {
    value
        .get("items")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id").and_then(|v| v.as_str())?;
                    let title = item
                        .get("snippet")
                        .and_then(|s| s.get("title"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("Unknown");
                    Some(ChannelIdentity {
                        id: id.to_owned(),
                        title: title.to_owned(),
                        kind,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Union the two listings, de-duplicated by channel id. Owned entries are
/// inserted first and win on collision.
pub fn merge_channel_lists(
    owned: Vec<ChannelIdentity>,
    managed: Vec<ChannelIdentity>,
) -> Vec<ChannelIdentity> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::with_capacity(owned.len() + managed.len());
    for channel in owned.into_iter().chain(managed) {
        if seen.insert(channel.id.clone()) {
            merged.push(channel);
        }
    }
    merged
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
