/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Minimal service exercising the request logging middleware.

use crate::context::RequestContext;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Extension, Json, Router};
use serde_json::json;

/// Routes of the demo service, not yet instrumented.
pub fn routes() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/fail", get(fail))
        .route("/panic", get(panic))
}

async fn ping(Extension(context): Extension<RequestContext>) -> impl IntoResponse {
    Json(json!({
        "message": "pong",
        "correlationId": context.correlation_id,
    }))
}

async fn fail() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "simulated failure"})),
    )
}

async fn panic() -> StatusCode {
    panic!("simulated handler panic");
}
