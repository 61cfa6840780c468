/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use axum::http::{Method, StatusCode};

#[tokio::test]
async fn test_health_all_connected() {
    let fixture = TestFixture::new();

    let (status, body) = fixture.request(Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["broker"], "connected");
}

#[tokio::test]
async fn test_health_reports_each_dependency() {
    let fixture = TestFixture::new();
    fixture.exchange.set_connected(false);

    let (status, body) = fixture.request(Method::GET, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["broker"], "disconnected");

    fixture.exchange.set_connected(true);
    fixture.store.set_failing(true);
    let (status, body) = fixture.request(Method::GET, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["broker"], "connected");
}

#[tokio::test]
async fn test_probes() {
    let fixture = TestFixture::new();

    assert_eq!(
        fixture.text("/healthz").await,
        (StatusCode::OK, "OK".to_string())
    );
    assert_eq!(
        fixture.text("/readyz").await,
        (StatusCode::OK, "Ready".to_string())
    );
}

#[tokio::test]
async fn test_metrics_exposition_tracks_requests() {
    let fixture = TestFixture::new();
    fixture.request(Method::POST, "/logs").await;

    let (status, text) = fixture.text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("courier_drain_passes_total"));
    assert!(text.contains("courier_http_requests_total"));
    assert!(text.contains("endpoint=\"/logs\""));
}

#[tokio::test]
async fn test_openapi_document_lists_log_paths() {
    let fixture = TestFixture::new();

    let (status, body) = fixture.request(Method::GET, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/logs"]["post"].is_object());
    assert!(body["paths"]["/logs"]["delete"].is_object());
    assert!(body["paths"]["/logs/stats"]["get"].is_object());
    assert!(body["paths"]["/health"]["get"].is_object());
}
