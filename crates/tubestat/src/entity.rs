// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure projection of a metric snapshot into host-visible entity states.

use serde::Serialize;
use serde_json::Value;

use crate::analytics::{MetricDef, MetricSnapshot};
use crate::channel::ChannelIdentity;

/// One read-only entity derived from the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub available: bool,
}

/// The per-account device record the host groups entities under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRecord {
    pub channel_id: String,
    pub channel_title: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
}

pub fn device_record(identity: &ChannelIdentity) -> DeviceRecord {
    DeviceRecord {
        channel_id: identity.id.clone(),
        channel_title: identity.title.clone(),
        manufacturer: "YouTube",
        model: "YouTube Channel",
    }
}

/// Project the snapshot onto the catalog.
///
/// Deterministic in both directions: identities are
/// `{channel_id}_{metric_key}` plus the window suffix, stable across
/// restarts and reauthentication. A key absent from the snapshot marks
/// only that entity unavailable; siblings keep their values. With no
/// snapshot at all (first cycle not yet succeeded, or reauth pending)
/// every entity is unavailable.
pub fn project(
    snapshot: Option<&MetricSnapshot>,
    catalog: &[MetricDef],
    identity: &ChannelIdentity,
) -> Vec<EntityState> {
    catalog
        .iter()
        .map(|def| {
            let value = snapshot.and_then(|s| s.get(def.key)).cloned();
            EntityState {
                unique_id: format!("{}_{}{}", identity.id, def.key, def.window.id_suffix()),
                display_name: display_name(identity, def),
                unit: def.unit,
                available: value.is_some(),
                value,
            }
        })
        .collect()
}

fn display_name(identity: &ChannelIdentity, def: &MetricDef) -> String {
    match def.window.name_qualifier() {
        Some(qualifier) => format!("{} {} {}", identity.title, def.display_name, qualifier),
        None => format!("{} {}", identity.title, def.display_name),
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
