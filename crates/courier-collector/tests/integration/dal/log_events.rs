/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! PostgreSQL tests for the log events DAL.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test -p courier-collector -- --ignored`

use crate::fixtures::{sample_row, PgFixture};
use chrono::Utc;
use courier_collector::store::LogStore;
use courier_models::models::{IncomingLogEvent, NewLogEvent};
use serial_test::serial;

#[test]
#[ignore = "requires DATABASE_URL"]
#[serial]
fn test_create_returns_generated_id() {
    let fixture = PgFixture::new();
    let row = sample_row(Some("delivery-service"), Some("INFO"), "2024-01-10T10:00:00.000Z");

    let stored = fixture.dal.log_events().create(&row).expect("Failed to insert log event");
    assert_eq!(stored.service_name.as_deref(), Some("delivery-service"));
    assert_eq!(stored.timestamp.as_deref(), Some("2024-01-10T10:00:00.000Z"));
    assert_eq!(fixture.dal.log_events().count().unwrap(), 1);
}

#[test]
#[ignore = "requires DATABASE_URL"]
#[serial]
fn test_sparse_event_is_stored_with_nulls() {
    let fixture = PgFixture::new();
    let row = NewLogEvent::new(IncomingLogEvent::default(), Utc::now());

    let stored = fixture.dal.log_events().create(&row).unwrap();
    assert!(stored.timestamp.is_none());
    assert!(stored.status_code.is_none());
}

#[test]
#[ignore = "requires DATABASE_URL"]
#[serial]
fn test_list_between_is_half_open_and_sorted() {
    let fixture = PgFixture::new();
    for ts in [
        "2023-12-31T23:59:59.999Z",
        "2024-01-01T00:00:00.000Z",
        "2024-01-31T23:59:59.000Z",
        "2024-02-01T00:00:00.000Z",
    ] {
        fixture.dal.log_events().create(&sample_row(Some("a"), Some("INFO"), ts)).unwrap();
    }

    let rows = fixture
        .dal
        .log_events()
        .list_between("2024-01-01T00:00:00", "2024-02-01T00:00:00")
        .unwrap();
    let timestamps: Vec<_> = rows.into_iter().filter_map(|r| r.timestamp).collect();
    assert_eq!(
        timestamps,
        vec!["2024-01-31T23:59:59.000Z", "2024-01-01T00:00:00.000Z"]
    );
}

#[test]
#[ignore = "requires DATABASE_URL"]
#[serial]
fn test_stats_groups_including_nulls() {
    let fixture = PgFixture::new();
    for _ in 0..3 {
        fixture.dal.insert(sample_row(Some("a"), Some("INFO"), "2024-01-10T10:00:00.000Z")).unwrap();
    }
    for _ in 0..2 {
        fixture.dal.insert(sample_row(Some("b"), Some("ERROR"), "2024-01-10T10:00:00.000Z")).unwrap();
    }
    fixture.dal.insert(sample_row(None, None, "2024-01-10T10:00:00.000Z")).unwrap();

    let stats = fixture.dal.stats().unwrap();
    assert_eq!(stats.total_logs, 6);
    assert_eq!(stats.service_count(Some("a")), 3);
    assert_eq!(stats.service_count(Some("b")), 2);
    assert_eq!(stats.service_count(None), 1);
    assert!(stats.by_type.iter().any(|g| g.key.is_none() && g.count == 1));
}

#[test]
#[ignore = "requires DATABASE_URL"]
#[serial]
fn test_purge_and_ping() {
    let fixture = PgFixture::new();
    fixture.dal.ping().expect("database should be reachable");
    assert_eq!(fixture.dal.purge().unwrap(), 0);

    for _ in 0..3 {
        fixture.dal.insert(sample_row(Some("a"), Some("INFO"), "2024-01-10T10:00:00.000Z")).unwrap();
    }
    assert_eq!(fixture.dal.purge().unwrap(), 3);
    assert_eq!(fixture.dal.log_events().count().unwrap(), 0);
}
