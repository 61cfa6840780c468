/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::api::health::{self, HealthReport};
use crate::api::logs::{self, DrainResponse, LogRangeResponse, PurgeResponse};
use crate::api::{AppState, ErrorResponse};
use axum::{response::Json, routing::get, Router};
use courier_models::models::{GroupCount, LogStats, StoredLogEvent};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        logs::drain_queue,
        logs::logs_in_range,
        logs::log_stats,
        logs::purge_logs,
        health::health,
    ),
    components(
        schemas(
            StoredLogEvent,
            LogStats,
            GroupCount,
            DrainResponse,
            LogRangeResponse,
            PurgeResponse,
            HealthReport,
            ErrorResponse,
        )
    ),
    tags(
        (name = "logs", description = "Log ingestion and query API"),
        (name = "health", description = "Dependency health API")
    )
)]
pub struct ApiDoc;

pub fn routes() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
