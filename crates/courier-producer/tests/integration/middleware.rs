/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::{TestFixture, BASE_URL, SERVICE_NAME};
use axum::body::to_bytes;
use axum::http::StatusCode;
use courier_models::models::LogType;
use uuid::Uuid;

fn correlation_header(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get("x-correlation-id")
        .expect("X-Correlation-Id header missing")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_successful_request_emits_info_event() {
    let fixture = TestFixture::new();

    let response = fixture.get("/ping", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let correlation_id = correlation_header(&response);
    assert!(Uuid::parse_str(&correlation_id).is_ok());

    // the handler sees the same context the middleware echoes
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["correlationId"], correlation_id);

    let event = fixture.next_event().await.expect("no event published");
    assert_eq!(event.correlation_id, correlation_id);
    assert_eq!(event.log_type, LogType::Info);
    assert_eq!(event.service_name, SERVICE_NAME);
    assert_eq!(event.url, format!("{}/ping", BASE_URL));
    assert_eq!(event.method, "GET");
    assert_eq!(event.status_code, 200);
    assert_eq!(
        event.message,
        format!("GET /ping - 200 ({}ms)", event.duration)
    );
}

#[tokio::test]
async fn test_inbound_correlation_id_is_echoed() {
    let fixture = TestFixture::new();

    let response = fixture.get("/ping", Some("order-42-trace")).await;
    assert_eq!(correlation_header(&response), "order-42-trace");

    let event = fixture.next_event().await.expect("no event published");
    assert_eq!(event.correlation_id, "order-42-trace");
}

#[tokio::test]
async fn test_error_response_is_correlated_and_logged_as_error() {
    let fixture = TestFixture::new();

    let response = fixture.get("/fail", Some("fail-1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(correlation_header(&response), "fail-1");

    let event = fixture.next_event().await.expect("no event published");
    assert_eq!(event.log_type, LogType::Error);
    assert_eq!(event.status_code, 500);
}

#[tokio::test]
async fn test_unknown_route_is_logged() {
    let fixture = TestFixture::new();

    let response = fixture.get("/missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let correlation_id = correlation_header(&response);

    let event = fixture.next_event().await.expect("no event published");
    assert_eq!(event.correlation_id, correlation_id);
    assert_eq!(event.log_type, LogType::Error);
    assert_eq!(event.status_code, 404);
}

#[tokio::test]
async fn test_handler_panic_becomes_correlated_500() {
    let fixture = TestFixture::new();

    let response = fixture.get("/panic", Some("panic-1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(correlation_header(&response), "panic-1");

    let event = fixture.next_event().await.expect("no event published");
    assert_eq!(event.correlation_id, "panic-1");
    assert_eq!(event.status_code, 500);
}

#[tokio::test]
async fn test_broker_outage_does_not_affect_responses() {
    let fixture = TestFixture::new();
    fixture.exchange.set_connected(false);

    let response = fixture.get("/ping", Some("outage-1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(correlation_header(&response), "outage-1");

    // the event is dropped after one reconnect attempt
    for _ in 0..200 {
        if fixture.exchange.reconnect_attempts() > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(fixture.exchange.publish_attempts(), 1);
    assert_eq!(fixture.exchange.reconnect_attempts(), 1);

    // later requests publish again once the broker is back
    fixture.exchange.set_connected(true);
    fixture.get("/ping", Some("outage-2")).await;
    let event = fixture.next_event().await.expect("no event published");
    assert_eq!(event.correlation_id, "outage-2");
}
