// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read client for the analytics and data endpoints.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use reqwest::Client;
use serde_json::Value;

use crate::analytics::{windowed_metric_keys, RECENT_UPLOADS_COUNT};
use crate::error::ApiError;

/// HTTP client wrapper for the two remote API surfaces.
pub struct AnalyticsClient {
    http: Client,
    data_base: String,
    analytics_base: String,
}

impl AnalyticsClient {
    pub fn new(data_base: String, analytics_base: String) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http, data_base, analytics_base }
    }

    /// Fetch the windowed report: one row of aggregate metrics over the
    /// trailing window ending yesterday.
    pub async fn fetch_windowed(
        &self,
        access_token: &str,
        channel_id: &str,
        window_days: u32,
    ) -> Result<HashMap<String, Value>, ApiError> {
        let (start_date, end_date) = window_range(today(), window_days);
        let ids = format!("channel=={channel_id}");
        let metrics = windowed_metric_keys().join(",");
        let resp = self
            .http
            .get(format!("{}/reports", self.analytics_base))
            .query(&[
                ("ids", ids.as_str()),
                ("startDate", start_date.as_str()),
                ("endDate", end_date.as_str()),
                ("metrics", metrics.as_str()),
            ])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, "reports query", &body));
        }

        let value: Value = resp.json().await?;
        parse_report(&value).ok_or_else(|| ApiError::Transient {
            reason: format!("reports query returned no rows for {channel_id}"),
        })
    }

    /// Fetch lifetime channel statistics.
    pub async fn fetch_lifetime(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<HashMap<String, Value>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/channels", self.data_base))
            .query(&[("part", "statistics,snippet"), ("id", channel_id)])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, "channels query", &body));
        }

        let value: Value = resp.json().await?;
        parse_channel_statistics(&value).ok_or_else(|| ApiError::Transient {
            reason: format!("channels query returned no items for {channel_id}"),
        })
    }

    /// Roll up statistics over the channel's most recent uploads.
    ///
    /// A channel with no uploads yields zeroes, not an error.
    pub async fn fetch_recent_uploads(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<HashMap<String, Value>, ApiError> {
        let max_results = RECENT_UPLOADS_COUNT.to_string();
        let resp = self
            .http
            .get(format!("{}/search", self.data_base))
            .query(&[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("type", "video"),
                ("order", "date"),
                ("maxResults", max_results.as_str()),
            ])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, "search query", &body));
        }

        let value: Value = resp.json().await?;
        let video_ids = parse_video_ids(&value);
        if video_ids.is_empty() {
            return Ok(zero_recent_uploads());
        }

        let joined_ids = video_ids.join(",");
        let resp = self
            .http
            .get(format!("{}/videos", self.data_base))
            .query(&[("part", "statistics"), ("id", joined_ids.as_str())])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, "videos query", &body));
        }

        let value: Value = resp.json().await?;
        Ok(rollup_video_statistics(&value))
    }
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Date range for the windowed report: `today - window_days` through
/// yesterday. The partial current day is never included, so identical
/// retries cannot observe shifting values.
pub fn window_range(today: NaiveDate, window_days: u32) -> (String, String) {
    let start = today.checked_sub_days(Days::new(u64::from(window_days))).unwrap_or(today);
    let end = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    (start.format("%Y-%m-%d").to_string(), end.format("%Y-%m-%d").to_string())
}

/// Zip `columnHeaders` with the first data row. `None` when the report has
/// no rows (brand-new channel, retention window, deleted channel).
pub fn parse_report(value: &Value) -> Option<HashMap<String, Value>> {
    let row = value.get("rows")?.as_array()?.first()?.as_array()?;
    let headers = value.get("columnHeaders")?.as_array()?;

    let mut out = HashMap::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let Some(name) = header.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        if let Some(cell) = row.get(i) {
            out.insert(name.to_owned(), cell.clone());
        }
    }
    Some(out)
}

/// Extract lifetime totals from a `channels.list` response. The data API
/// reports counters as strings.
pub fn parse_channel_statistics(value: &Value) -> Option<HashMap<String, Value>> {
    let channel = value.get("items")?.as_array()?.first()?;
    let stats = channel.get("statistics")?;

    Some(HashMap::from([
        ("subscriber_count".to_owned(), Value::from(count_field(stats, "subscriberCount"))),
        ("video_count".to_owned(), Value::from(count_field(stats, "videoCount"))),
        ("view_count".to_owned(), Value::from(count_field(stats, "viewCount"))),
    ]))
}

/// Video ids from a `search.list` response.
pub fn parse_video_ids(value: &Value) -> Vec<String> {
    value
        .get("items")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id")?.get("videoId")?.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Sum per-video statistics from a `videos.list` response.
pub fn rollup_video_statistics(value: &Value) -> HashMap<String, Value> {
    let empty = Vec::new();
    let items = value.get("items").and_then(|v| v.as_array()).unwrap_or(&empty);

    let mut views = 0i64;
    let mut likes = 0i64;
    let mut comments = 0i64;
    for item in items {
        if let Some(stats) = item.get("statistics") {
            views += count_field(stats, "viewCount");
            likes += count_field(stats, "likeCount");
            comments += count_field(stats, "commentCount");
        }
    }

    HashMap::from([
        ("recent_videos_count".to_owned(), Value::from(items.len() as i64)),
        ("recent_videos_total_views".to_owned(), Value::from(views)),
        ("recent_videos_total_likes".to_owned(), Value::from(likes)),
        ("recent_videos_total_comments".to_owned(), Value::from(comments)),
    ])
}

fn zero_recent_uploads() -> HashMap<String, Value> {
    HashMap::from([
        ("recent_videos_count".to_owned(), Value::from(0)),
        ("recent_videos_total_views".to_owned(), Value::from(0)),
        ("recent_videos_total_likes".to_owned(), Value::from(0)),
        ("recent_videos_total_comments".to_owned(), Value::from(0)),
    ])
}

/// Read a counter that may arrive as a JSON number or a decimal string.
fn count_field(stats: &Value, key: &str) -> i64 {
    match stats.get(key) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
