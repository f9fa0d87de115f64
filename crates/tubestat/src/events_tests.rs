// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn events_tag_with_snake_case_type() -> anyhow::Result<()> {
    let event = WatchEvent::Snapshot {
        channel: "UCx".to_owned(),
        fetched_at_ms: 1234,
        metric_count: 19,
    };
    let value = serde_json::to_value(&event)?;
    assert_eq!(value["type"], "snapshot");
    assert_eq!(value["channel"], "UCx");
    assert_eq!(value["metric_count"], 19);

    let event = WatchEvent::ReauthRequired {
        channel: "UCx".to_owned(),
        error: "refresh rejected".to_owned(),
    };
    let value = serde_json::to_value(&event)?;
    assert_eq!(value["type"], "reauth_required");
    Ok(())
}

#[test]
fn channel_accessor_covers_all_variants() {
    let events = [
        WatchEvent::Snapshot { channel: "UCa".to_owned(), fetched_at_ms: 0, metric_count: 0 },
        WatchEvent::UpdateFailed {
            channel: "UCa".to_owned(),
            error: "boom".to_owned(),
            consecutive_failures: 1,
        },
        WatchEvent::ReauthRequired { channel: "UCa".to_owned(), error: "gone".to_owned() },
    ];
    for event in &events {
        assert_eq!(event.channel(), "UCa");
    }
}

#[tokio::test]
async fn hub_delivers_to_subscribers() -> anyhow::Result<()> {
    let hub = EventHub::new();
    let mut rx = hub.subscribe();

    hub.send(WatchEvent::Snapshot {
        channel: "UCa".to_owned(),
        fetched_at_ms: 7,
        metric_count: 19,
    });

    match rx.try_recv()? {
        WatchEvent::Snapshot { fetched_at_ms, .. } => assert_eq!(fetched_at_ms, 7),
        other => panic!("expected Snapshot, got {other:?}"),
    }
    Ok(())
}

#[test]
fn send_without_subscribers_is_a_no_op() {
    let hub = EventHub::new();
    hub.send(WatchEvent::ReauthRequired {
        channel: "UCa".to_owned(),
        error: "gone".to_owned(),
    });
}
