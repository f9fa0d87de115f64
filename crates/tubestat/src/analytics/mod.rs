// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metric catalog and snapshot merging.
//!
//! The catalog is static: every entity the projection can ever emit is
//! defined here, and a successful poll cycle must produce a value for each
//! key. Raw API keys are kept as-is in the snapshot; window suffixes only
//! exist in entity identities.

pub mod fetcher;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ConfigurationError;
use crate::state::epoch_ms;

/// Trailing window for the analytics report query, in days.
pub const WINDOW_DAYS: u32 = 30;

/// How many recent uploads the per-video rollup covers.
pub const RECENT_UPLOADS_COUNT: u32 = 10;

/// Which aggregation window a metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricWindow {
    /// Trailing 30 days ending yesterday.
    Days30,
    /// Cumulative channel totals.
    Lifetime,
    /// Rollup over the last 10 uploads.
    RecentUploads,
}

impl MetricWindow {
    /// Suffix appended to the metric key to form the entity identity.
    pub fn id_suffix(&self) -> &'static str {
        match self {
            Self::Days30 => "_30d",
            Self::Lifetime => "",
            Self::RecentUploads => "_10vids",
        }
    }

    /// Qualifier appended to the display name.
    pub fn name_qualifier(&self) -> Option<&'static str> {
        match self {
            Self::Days30 => Some("(30 days)"),
            Self::Lifetime => None,
            Self::RecentUploads => Some("(Last 10 Videos)"),
        }
    }
}

/// Value rewrite applied when merging raw API values into the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// The API reports watch time in minutes; entities show hours.
    MinutesToHours,
}

impl Transform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::MinutesToHours => round2(value / 60.0),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// One externally visible metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    /// Raw API key, also the snapshot key.
    pub key: &'static str,
    pub display_name: &'static str,
    pub window: MetricWindow,
    pub unit: Option<&'static str>,
    pub transform: Transform,
}

/// Every metric this integration emits.
pub const CATALOG: &[MetricDef] = &[
    // 30-day analytics report
    MetricDef {
        key: "views",
        display_name: "Views",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "estimatedMinutesWatched",
        display_name: "Watch Hours",
        window: MetricWindow::Days30,
        unit: Some("h"),
        transform: Transform::MinutesToHours,
    },
    MetricDef {
        key: "averageViewDuration",
        display_name: "Average View Duration",
        window: MetricWindow::Days30,
        unit: Some("s"),
        transform: Transform::Identity,
    },
    MetricDef {
        key: "averageViewPercentage",
        display_name: "Average View Percentage",
        window: MetricWindow::Days30,
        unit: Some("%"),
        transform: Transform::Identity,
    },
    MetricDef {
        key: "likes",
        display_name: "Likes",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "dislikes",
        display_name: "Dislikes",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "comments",
        display_name: "Comments",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "shares",
        display_name: "Shares",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "subscribersGained",
        display_name: "Subscribers Gained",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "subscribersLost",
        display_name: "Subscribers Lost",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "annotationClicks",
        display_name: "Annotation Clicks",
        window: MetricWindow::Days30,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "annotationClickThroughRate",
        display_name: "Annotation Click Through Rate",
        window: MetricWindow::Days30,
        unit: Some("%"),
        transform: Transform::Identity,
    },
    // Lifetime channel statistics
    MetricDef {
        key: "subscriber_count",
        display_name: "Subscriber Count",
        window: MetricWindow::Lifetime,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "video_count",
        display_name: "Video Count",
        window: MetricWindow::Lifetime,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "view_count",
        display_name: "Total Views",
        window: MetricWindow::Lifetime,
        unit: None,
        transform: Transform::Identity,
    },
    // Recent-uploads rollup
    MetricDef {
        key: "recent_videos_count",
        display_name: "Recent Videos Count",
        window: MetricWindow::RecentUploads,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "recent_videos_total_views",
        display_name: "Recent Videos Total Views",
        window: MetricWindow::RecentUploads,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "recent_videos_total_likes",
        display_name: "Recent Videos Total Likes",
        window: MetricWindow::RecentUploads,
        unit: None,
        transform: Transform::Identity,
    },
    MetricDef {
        key: "recent_videos_total_comments",
        display_name: "Recent Videos Total Comments",
        window: MetricWindow::RecentUploads,
        unit: None,
        transform: Transform::Identity,
    },
];

/// Keys requested from the analytics report query, in catalog order.
pub fn windowed_metric_keys() -> Vec<&'static str> {
    CATALOG.iter().filter(|d| d.window == MetricWindow::Days30).map(|d| d.key).collect()
}

/// Check catalog self-consistency. Called once at startup; a failure here
/// is a build defect, not a runtime condition.
pub fn validate_catalog() -> Result<(), ConfigurationError> {
    let mut seen = std::collections::HashSet::new();
    for def in CATALOG {
        if !seen.insert(def.key) {
            return Err(ConfigurationError(format!("duplicate metric key {:?}", def.key)));
        }
        if def.key.is_empty() || def.display_name.is_empty() {
            return Err(ConfigurationError(format!("empty name in definition {:?}", def.key)));
        }
    }
    Ok(())
}

/// One merged poll result: every catalog key mapped to a scalar.
#[derive(Debug, Clone, Default)]
pub struct MetricSnapshot {
    pub values: HashMap<String, Value>,
    /// When the merge completed, epoch millis.
    pub fetched_at_ms: u64,
}

impl MetricSnapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Merge per-query result maps into one snapshot, applying each catalog
/// transform to its key.
pub fn merge_snapshot(parts: Vec<HashMap<String, Value>>) -> MetricSnapshot {
    let mut values = HashMap::new();
    for part in parts {
        values.extend(part);
    }
    for def in CATALOG {
        if def.transform == Transform::Identity {
            continue;
        }
        if let Some(v) = values.get_mut(def.key) {
            if let Some(raw) = v.as_f64() {
                if let Some(n) = serde_json::Number::from_f64(def.transform.apply(raw)) {
                    *v = Value::Number(n);
                }
            }
        }
    }
    MetricSnapshot { values, fetched_at_ms: epoch_ms() }
}

/// Catalog keys absent from a snapshot. Non-empty after a merge means the
/// cycle failed.
pub fn missing_keys(snapshot: &MetricSnapshot) -> Vec<&'static str> {
    CATALOG.iter().map(|d| d.key).filter(|k| !snapshot.values.contains_key(*k)).collect()
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
