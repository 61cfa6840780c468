/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Metrics Module
//!
//! Prometheus metrics for the log collector: HTTP traffic on the log API
//! and the outcome of every drain pass.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Instant;
use tracing::error;

/// Global Prometheus registry for all collector metrics
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// HTTP request counter
/// Labels: endpoint, method, status
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "courier_http_requests_total",
        "Total number of HTTP requests by endpoint and status",
    );
    let counter = CounterVec::new(opts, &["endpoint", "method", "status"])
        .expect("Failed to create HTTP requests counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register HTTP requests counter");
    counter
});

/// HTTP request duration histogram
/// Labels: endpoint, method
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "courier_http_request_duration_seconds",
        "HTTP request latency distribution in seconds",
    )
    .buckets(vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]);
    let histogram = HistogramVec::new(opts, &["endpoint", "method"])
        .expect("Failed to create HTTP request duration histogram");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("Failed to register HTTP request duration histogram");
    histogram
});

/// Events persisted and acknowledged by the ingestion worker
pub static LOG_EVENTS_PERSISTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "courier_log_events_persisted_total",
        "Total number of log events persisted from the queue",
    )
    .expect("Failed to create persisted events counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register persisted events counter");
    counter
});

/// Messages handed back to the queue after a failed parse or insert
pub static LOG_EVENTS_REQUEUED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "courier_log_events_requeued_total",
        "Total number of messages requeued by the ingestion worker",
    )
    .expect("Failed to create requeued events counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register requeued events counter");
    counter
});

/// Drain passes by outcome
/// Labels: outcome (completed, halted, failed)
pub static DRAIN_PASSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "courier_drain_passes_total",
        "Total number of drain passes by outcome",
    );
    let counter =
        IntCounterVec::new(opts, &["outcome"]).expect("Failed to create drain passes counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register drain passes counter");
    counter
});

/// Records request count and latency per matched route.
///
/// Unmatched requests are grouped under a single `unmatched` endpoint so
/// arbitrary paths cannot blow up label cardinality.
pub async fn track_http_metrics(request: Request<Body>, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[endpoint.as_str(), method.as_str(), status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str(), method.as_str()])
        .observe(start.elapsed().as_secs_f64());

    response
}

/// Encodes all registered metrics in Prometheus text format
///
/// # Returns
///
/// Returns a String containing all metrics in Prometheus exposition format.
/// Encoding failures are logged and yield an empty exposition.
pub fn encode_metrics() -> String {
    // touch the statics so every family is registered before the first scrape
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION_SECONDS);
    Lazy::force(&LOG_EVENTS_PERSISTED_TOTAL);
    Lazy::force(&LOG_EVENTS_REQUEUED_TOTAL);
    Lazy::force(&DRAIN_PASSES_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
