/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # CLI Commands Module
//!
//! `serve` starts the demo service:
//! 1. Loads configuration
//! 2. Initializes tracing
//! 3. Opens the broker session (an unreachable broker is tolerated)
//! 4. Starts the log producer and the instrumented HTTP server
//!
//! ctrl-c stops the server gracefully and flushes pending spans.

use crate::demo;
use crate::middleware;
use crate::producer::{LogProducer, ServiceIdentity};
use courier_amqp::{AmqpSession, TopologyRole};
use courier_utils::config::Settings;
use courier_utils::telemetry;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn serve(config_file: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Settings::new(config_file)?;
    telemetry::init(
        &config.telemetry.for_producer(),
        &config.log.level,
        &config.log.format,
    )?;
    info!("Starting courier demo producer");

    let session = AmqpSession::start(&config.amqp, TopologyRole::Producer).await?;
    let session = Arc::new(session);

    let identity = ServiceIdentity::from_settings(&config.producer);
    let producer = LogProducer::new(session.clone(), identity, config.producer.queue_capacity);

    let app = middleware::instrument(demo::routes(), producer).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.producer.bind_address).await?;
    info!("Demo producer listening on {}", config.producer.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    session.close().await;
    telemetry::shutdown();
    Ok(())
}
