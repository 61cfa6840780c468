/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Per-request correlation context.

use axum::http::{HeaderMap, HeaderName};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Header carrying the correlation id in both directions.
pub static CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Correlation id and start instant of one inbound request.
///
/// Inserted into the request extensions by the middleware, so handlers can
/// read it with `Extension<RequestContext>`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    /// Starts a context for a request, reusing an inbound correlation id when
    /// one is supplied and usable, and generating a UUID v4 otherwise.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let inbound = headers
            .get(&CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty());

        RequestContext {
            correlation_id: inbound
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whole milliseconds since the request started.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
