/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Courier Producer
//!
//! Request instrumentation for axum services. Every request routed through
//! [`middleware::instrument`] gets a [`context::RequestContext`] (correlation
//! id and start instant), has its correlation id echoed back in
//! `X-Correlation-Id`, and produces one [`courier_models::models::LogEvent`]
//! once its status is known. Events are handed to a [`producer::LogProducer`],
//! which publishes them to the broker off the response path.
//!
//! ```rust,ignore
//! let session = AmqpSession::start(&settings.amqp, TopologyRole::Producer).await?;
//! let producer = LogProducer::new(Arc::new(session), identity, settings.producer.queue_capacity);
//! let app = middleware::instrument(routes(), producer);
//! ```

pub mod cli;
pub mod context;
pub mod demo;
pub mod middleware;
pub mod producer;
