/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # API Routes Aggregator Module
//!
//! Builds the collector's HTTP router: the log endpoints, the health and
//! probe endpoints, Prometheus metrics and the OpenAPI document.

pub mod health;
pub mod logs;
pub mod openapi;

use crate::ingest::Ingestor;
use crate::metrics;
use crate::store::LogStore;
use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use courier_utils::config::Cors;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::ToSchema;

/// Shared state of the collector API.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>, ingestor: Arc<Ingestor>) -> Self {
        AppState { store, ingestor }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Configures and returns the collector router with its state applied.
///
/// # Arguments
///
/// * `state` - Store and ingestion worker shared by the handlers
/// * `cors` - Allowed origins and preflight cache duration
pub fn configure_api_routes(state: AppState, cors: &Cors) -> Router {
    Router::new()
        .merge(logs::routes())
        .merge(health::routes())
        .merge(openapi::routes())
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(from_fn(metrics::track_http_metrics))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// Builds the CORS layer. A `*` entry allows any origin.
pub fn cors_layer(cors: &Cors) -> CorsLayer {
    let origin = if cors.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(cors.max_age_seconds))
}

/// Liveness probe.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe.
async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, "Ready")
}

/// Prometheus text exposition of the collector metrics.
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::encode_metrics(),
    )
}
