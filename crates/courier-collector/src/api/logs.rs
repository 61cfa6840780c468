/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Log API endpoints.
//!
//! `POST /logs` runs a drain pass, `GET /logs/{dateFrom}/{dateTo}` reads a
//! date range, `GET /logs/stats` aggregates and `DELETE /logs` purges.

use crate::api::{api_error, ApiError, AppState, ErrorResponse};
use crate::query::{self, DateRange, QueryError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use courier_models::models::{LogStats, StoredLogEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Creates and returns the router for log endpoints.
pub fn routes() -> Router<AppState> {
    info!("Setting up log routes");
    Router::new()
        .route("/logs", post(drain_queue).delete(purge_logs))
        .route("/logs/stats", get(log_stats))
        .route("/logs/:date_from/:date_to", get(logs_in_range))
}

/// Result of a drain pass.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrainResponse {
    pub message: String,
    /// Events persisted by the pass.
    pub count: usize,
}

/// Events within a date range.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogRangeResponse {
    pub count: usize,
    pub date_from: String,
    pub date_to: String,
    pub logs: Vec<StoredLogEvent>,
}

/// Result of a purge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub message: String,
    pub deleted_count: usize,
}

fn query_error(e: QueryError) -> ApiError {
    match e {
        QueryError::InvalidDate(value) => {
            warn!("Rejected malformed date '{}'", value);
            api_error(StatusCode::BAD_REQUEST, QueryError::InvalidDate(value))
        }
        QueryError::Store(e) => {
            error!("Log store error: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Drains the log queue into the store.
#[utoipa::path(
    post,
    path = "/logs",
    tag = "logs",
    responses(
        (status = 200, description = "Drain pass completed", body = DrainResponse),
        (status = 503, description = "Broker unreachable", body = ErrorResponse),
    )
)]
async fn drain_queue(State(state): State<AppState>) -> Result<Json<DrainResponse>, ApiError> {
    info!("Handling drain request");
    match state.ingestor.drain().await {
        Ok(count) => Ok(Json(DrainResponse {
            message: format!("Successfully fetched {} logs from queue", count),
            count,
        })),
        Err(e) => Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e)),
    }
}

/// Lists events whose timestamp falls within an inclusive date range.
#[utoipa::path(
    get,
    path = "/logs/{date_from}/{date_to}",
    tag = "logs",
    params(
        ("date_from" = String, Path, description = "First day, YYYY-MM-DD"),
        ("date_to" = String, Path, description = "Last day, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Events in range, newest first", body = LogRangeResponse),
        (status = 400, description = "Malformed date", body = ErrorResponse),
        (status = 500, description = "Log store error", body = ErrorResponse),
    )
)]
async fn logs_in_range(
    State(state): State<AppState>,
    Path((date_from, date_to)): Path<(String, String)>,
) -> Result<Json<LogRangeResponse>, ApiError> {
    let range = DateRange::parse(&date_from, &date_to).map_err(query_error)?;
    let logs = query::find_range(state.store.as_ref(), &range).map_err(query_error)?;
    info!(
        "Found {} logs between {} and {}",
        logs.len(),
        date_from,
        date_to
    );
    Ok(Json(LogRangeResponse {
        count: logs.len(),
        date_from,
        date_to,
        logs,
    }))
}

/// Returns total and grouped event counts.
#[utoipa::path(
    get,
    path = "/logs/stats",
    tag = "logs",
    responses(
        (status = 200, description = "Aggregated counts", body = LogStats),
        (status = 500, description = "Log store error", body = ErrorResponse),
    )
)]
async fn log_stats(State(state): State<AppState>) -> Result<Json<LogStats>, ApiError> {
    query::stats(state.store.as_ref())
        .map(Json)
        .map_err(query_error)
}

/// Deletes every stored event.
#[utoipa::path(
    delete,
    path = "/logs",
    tag = "logs",
    responses(
        (status = 200, description = "All events deleted", body = PurgeResponse),
        (status = 500, description = "Log store error", body = ErrorResponse),
    )
)]
async fn purge_logs(State(state): State<AppState>) -> Result<Json<PurgeResponse>, ApiError> {
    let deleted_count = query::purge(state.store.as_ref()).map_err(query_error)?;
    info!("Purged {} logs", deleted_count);
    Ok(Json(PurgeResponse {
        message: format!("Successfully deleted {} logs", deleted_count),
        deleted_count,
    }))
}
