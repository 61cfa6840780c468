/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Dependency health endpoint.

use crate::api::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

/// Creates and returns the router for the health endpoint.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Connectivity of the store and the broker, reported independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    /// `ok` when both dependencies are connected, `degraded` otherwise.
    pub status: String,
    pub database: String,
    pub broker: String,
}

fn connectivity(connected: bool) -> String {
    let label = if connected { "connected" } else { "disconnected" };
    label.to_string()
}

/// Reports store and broker connectivity.
///
/// Never opens a broker connection; a broker that has not been reached yet
/// reports as disconnected.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "All dependencies connected", body = HealthReport),
        (status = 503, description = "At least one dependency unreachable", body = HealthReport),
    )
)]
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = match state.store.ping() {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check could not reach the log store: {}", e);
            false
        }
    };
    let broker = state.ingestor.broker_connected().await;

    let healthy = database && broker;
    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        database: connectivity(database),
        broker: connectivity(broker),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
