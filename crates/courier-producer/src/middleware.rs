/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Request logging middleware.
//!
//! [`instrument`] wraps a router so that every request, including ones whose
//! handler fails or panics, carries a correlation id, answers with the
//! `X-Correlation-Id` header and is recorded by the [`LogProducer`].

use crate::context::{RequestContext, CORRELATION_HEADER};
use crate::producer::LogProducer;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

/// Times the request, echoes its correlation id and records its outcome.
pub async fn request_log_middleware(
    State(producer): State<LogProducer>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let context = RequestContext::from_headers(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(context.clone());

    let mut response = next.run(request).await;

    // generated ids are UUIDs and inbound ones were valid header values already
    if let Ok(value) = HeaderValue::from_str(&context.correlation_id) {
        response.headers_mut().insert(&CORRELATION_HEADER, value);
    }
    producer.record(&context, &method, &path, response.status());

    response
}

/// Adds request logging to `router`. Handler panics become 500 responses
/// inside the instrumented stack so they are logged and correlated too.
pub fn instrument<S>(router: Router<S>, producer: LogProducer) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::new())
        .layer(from_fn_with_state(producer, request_log_middleware))
}
