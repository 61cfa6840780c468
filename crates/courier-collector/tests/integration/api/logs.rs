/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::{sample_event, sample_row, TestFixture, QUEUE};
use axum::http::{Method, StatusCode};
use chrono::{DateTime, Utc};
use courier_amqp::{DeliverySource, EventPublisher};
use courier_collector::store::LogStore;
use courier_models::models::{IncomingLogEvent, NewLogEvent, StoredLogEvent};

#[tokio::test]
async fn test_drain_persists_published_fields() {
    let fixture = TestFixture::new();
    let published_at = Utc::now();
    let event = sample_event("delivery-service", "corr-1", "2024-01-10T10:00:00.000Z");
    fixture.publish(&event).await;

    let (status, body) = fixture.request(Method::POST, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["message"], "Successfully fetched 1 logs from queue");

    let rows = fixture.store.rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.timestamp.as_deref(), Some("2024-01-10T10:00:00.000Z"));
    assert_eq!(row.log_type.as_deref(), Some("INFO"));
    assert_eq!(row.url.as_deref(), Some("http://localhost:3004/deliveries"));
    assert_eq!(row.correlation_id.as_deref(), Some("corr-1"));
    assert_eq!(row.service_name.as_deref(), Some("delivery-service"));
    assert_eq!(row.message.as_deref(), Some("GET /deliveries - 200 (4ms)"));
    assert_eq!(row.method.as_deref(), Some("GET"));
    assert_eq!(row.status_code, Some(200));
    assert_eq!(row.duration, Some(4));
    assert!(row.retrieved_at >= published_at);

    assert_eq!(fixture.exchange.ready_count(QUEUE), 0);
    assert_eq!(fixture.exchange.unacked_count(QUEUE), 0);
}

#[tokio::test]
async fn test_drain_empty_queue_returns_zero() {
    let fixture = TestFixture::new();

    let (status, body) = fixture.request(Method::POST, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_crash_before_ack_duplicates_row() {
    let fixture = TestFixture::new();
    let queue = fixture.exchange.bind_queue(QUEUE);
    fixture
        .publish(&sample_event("delivery-service", "dup-1", "2024-01-10T10:00:00.000Z"))
        .await;

    // persist without acknowledging, then lose the consumer
    let message = queue.fetch().await.unwrap().unwrap();
    let incoming = IncomingLogEvent::from_payload(&message.payload).unwrap();
    fixture.insert(NewLogEvent::new(incoming, Utc::now()));
    drop(message);
    fixture.exchange.recover();

    let (status, body) = fixture.request(Method::POST, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let rows = fixture.store.rows();
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].id, rows[1].id);
    assert!(rows[1].retrieved_at >= rows[0].retrieved_at);
    let strip = |r: &StoredLogEvent| {
        (
            r.timestamp.clone(),
            r.correlation_id.clone(),
            r.service_name.clone(),
            r.message.clone(),
            r.status_code,
            r.duration,
        )
    };
    assert_eq!(strip(&rows[0]), strip(&rows[1]));
}

#[tokio::test]
async fn test_poison_message_halts_pass_and_stays_queued() {
    let fixture = TestFixture::new();
    fixture
        .publish(&sample_event("a", "ok-1", "2024-01-10T10:00:00.000Z"))
        .await;
    fixture.exchange.publish(b"not json").await.unwrap();
    fixture
        .publish(&sample_event("a", "ok-2", "2024-01-10T10:00:01.000Z"))
        .await;

    let (status, body) = fixture.request(Method::POST, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(fixture.exchange.ready_count(QUEUE), 2);
    assert_eq!(fixture.exchange.unacked_count(QUEUE), 0);
}

#[tokio::test]
async fn test_unknown_log_type_is_stored_as_sent() {
    let fixture = TestFixture::new();
    fixture
        .exchange
        .publish(br#"{"serviceName":"legacy","logType":"WARN","statusCode":200}"#)
        .await
        .unwrap();
    fixture
        .publish(&sample_event("a", "ok-1", "2024-01-10T10:00:00.000Z"))
        .await;

    let (status, body) = fixture.request(Method::POST, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(fixture.exchange.ready_count(QUEUE), 0);

    let (_, stats) = fixture.request(Method::GET, "/logs/stats").await;
    assert_eq!(stats["totalLogs"], 2);
    let types = stats["byType"].as_array().unwrap();
    assert!(types.iter().any(|g| g["_id"] == "WARN" && g["count"] == 1));
    assert!(types.iter().any(|g| g["_id"] == "INFO" && g["count"] == 1));
}

#[tokio::test]
async fn test_drain_with_broker_down_is_unavailable() {
    let fixture = TestFixture::new();
    fixture
        .publish(&sample_event("a", "down-1", "2024-01-10T10:00:00.000Z"))
        .await;
    fixture.exchange.set_connected(false);

    let (status, body) = fixture.request(Method::POST, "/logs").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("broker unavailable"));
    assert!(fixture.store.rows().is_empty());

    fixture.exchange.set_connected(true);
    assert_eq!(fixture.exchange.ready_count(QUEUE), 1);
}

#[tokio::test]
async fn test_range_query_is_inclusive_and_newest_first() {
    let fixture = TestFixture::new();
    for ts in [
        "2023-12-31T23:59:59.999Z",
        "2024-01-01T00:00:00.000Z",
        "2024-01-15T08:30:00.000Z",
        "2024-01-31T23:59:59.000Z",
        "2024-01-31T23:59:59.999Z",
        "2024-02-01T00:00:00.000Z",
    ] {
        fixture.insert(sample_row(Some("a"), Some("INFO"), ts));
    }

    let (status, body) = fixture
        .request(Method::GET, "/logs/2024-01-01/2024-01-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    assert_eq!(body["dateFrom"], "2024-01-01");
    assert_eq!(body["dateTo"], "2024-01-31");

    let timestamps: Vec<&str> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["timestamp"].as_str().unwrap())
        .collect();
    assert_eq!(
        timestamps,
        vec![
            "2024-01-31T23:59:59.999Z",
            "2024-01-31T23:59:59.000Z",
            "2024-01-15T08:30:00.000Z",
            "2024-01-01T00:00:00.000Z",
        ]
    );

    let first = &body["logs"][0];
    assert!(first["_id"].is_string());
    assert!(first["retrievedAt"].is_string());
}

#[tokio::test]
async fn test_range_query_with_no_matches_is_empty() {
    let fixture = TestFixture::new();
    fixture.insert(sample_row(Some("a"), Some("INFO"), "2024-01-15T08:30:00.000Z"));

    let (status, body) = fixture
        .request(Method::GET, "/logs/2025-01-01/2025-01-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["logs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_date_is_rejected_without_store_access() {
    let fixture = TestFixture::new();

    let (status, body) = fixture
        .request(Method::GET, "/logs/not-a-date/2024-01-31")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD");
    assert_eq!(fixture.store.calls(), 0);
}

#[tokio::test]
async fn test_stats_groups_by_service_and_type() {
    let fixture = TestFixture::new();
    for _ in 0..3 {
        fixture.insert(sample_row(Some("a"), Some("INFO"), "2024-01-10T10:00:00.000Z"));
    }
    for _ in 0..2 {
        fixture.insert(sample_row(Some("b"), Some("ERROR"), "2024-01-10T10:00:00.000Z"));
    }

    let (status, body) = fixture.request(Method::GET, "/logs/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalLogs"], 5);

    let count_for = |field: &str, key: &str| {
        body[field]
            .as_array()
            .unwrap()
            .iter()
            .find(|g| g["_id"] == key)
            .map(|g| g["count"].as_i64().unwrap())
    };
    assert_eq!(count_for("byService", "a"), Some(3));
    assert_eq!(count_for("byService", "b"), Some(2));
    assert_eq!(count_for("byType", "INFO"), Some(3));
    assert_eq!(count_for("byType", "ERROR"), Some(2));
}

#[tokio::test]
async fn test_stats_counts_missing_fields_under_null() {
    let fixture = TestFixture::new();
    fixture.insert(sample_row(None, None, "2024-01-10T10:00:00.000Z"));

    let (status, body) = fixture.request(Method::GET, "/logs/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalLogs"], 1);
    assert!(body["byService"][0]["_id"].is_null());
    assert_eq!(body["byService"][0]["count"], 1);
    assert!(body["byType"][0]["_id"].is_null());
}

#[tokio::test]
async fn test_purge_empties_store() {
    let fixture = TestFixture::new();

    let (status, body) = fixture.request(Method::DELETE, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 0);
    assert_eq!(body["message"], "Successfully deleted 0 logs");

    for _ in 0..4 {
        fixture.insert(sample_row(Some("a"), Some("INFO"), "2024-01-10T10:00:00.000Z"));
    }
    let (status, body) = fixture.request(Method::DELETE, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 4);
    assert!(fixture.store.rows().is_empty());
}

#[tokio::test]
async fn test_store_outage_returns_server_error() {
    let fixture = TestFixture::new();
    fixture.store.set_failing(true);

    for (method, uri) in [
        (Method::GET, "/logs/stats"),
        (Method::DELETE, "/logs"),
        (Method::GET, "/logs/2024-01-01/2024-01-31"),
    ] {
        let (status, body) = fixture.request(method, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_stored_rows_carry_ingestion_time() {
    let fixture = TestFixture::new();
    let before: DateTime<Utc> = Utc::now();
    fixture
        .publish(&sample_event("a", "time-1", "2024-01-10T10:00:00.000Z"))
        .await;
    fixture.request(Method::POST, "/logs").await;

    let row = fixture
        .store
        .find_between("2024-01-10T00:00:00", "2024-01-11T00:00:00")
        .unwrap()
        .pop()
        .unwrap();
    assert!(row.retrieved_at >= before);
    assert!(row.retrieved_at <= Utc::now());
}
