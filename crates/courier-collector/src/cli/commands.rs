/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::api::{self, AppState};
use crate::dal::DAL;
use crate::db::{create_shared_connection_pool, ConnectionPool};
use crate::ingest::Ingestor;
use crate::query;
use crate::store::LogStore;
use crate::utils;
use crate::utils::background_tasks::{start_periodic_drain_task, PeriodicDrainConfig};
use courier_amqp::{AmqpSession, TopologyRole};
use courier_utils::config::Settings;
use courier_utils::logging::prelude::*;
use std::sync::Arc;

/// Opens the pool and applies migrations.
///
/// A database that cannot be reached at startup is logged, not fatal: the
/// health endpoint reports it and queries fail until it comes back.
fn open_store(config: &Settings) -> Result<ConnectionPool, Box<dyn std::error::Error>> {
    info!("Creating database connection pool");
    let connection_pool =
        create_shared_connection_pool(&config.database.url, config.database.pool_size)?;

    info!("Running pending database migrations");
    match connection_pool.run_migrations() {
        Ok(applied) => info!("Database migrations completed ({} applied)", applied),
        Err(e) => warn!("Could not run migrations, the log store is unavailable: {}", e),
    }
    Ok(connection_pool)
}

/// Function to start the Courier Collector server
///
/// This function opens the log store and the broker session, starts the
/// optional periodic drain, and serves the log API with graceful shutdown
/// support.
pub async fn serve(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Courier Collector application");

    let connection_pool = open_store(config)?;
    let dal = DAL::new(connection_pool.pool.clone());
    let store: Arc<dyn LogStore> = Arc::new(dal);

    info!("Opening broker session");
    let session = Arc::new(AmqpSession::start(&config.amqp, TopologyRole::Collector).await?);
    let ingestor = Arc::new(Ingestor::new(session.clone(), store.clone()));

    let drain_task = start_periodic_drain_task(
        ingestor.clone(),
        PeriodicDrainConfig {
            interval_seconds: config.collector.drain_interval_seconds,
        },
    );

    info!("Configuring API routes");
    let app = api::configure_api_routes(AppState::new(store, ingestor), &config.cors);

    info!("Starting server on {}", config.collector.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.collector.bind_address).await?;

    info!("Courier Collector is now running");
    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await?;

    if let Some(task) = drain_task {
        task.abort();
    }
    session.close().await;
    Ok(())
}

/// Runs one drain pass against the configured broker and store.
pub async fn drain(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let connection_pool = open_store(config)?;
    let store: Arc<dyn LogStore> = Arc::new(DAL::new(connection_pool.pool.clone()));
    let session = Arc::new(AmqpSession::start(&config.amqp, TopologyRole::Collector).await?);

    let ingestor = Ingestor::new(session.clone(), store);
    let result = ingestor.drain().await;
    session.close().await;

    let persisted = result?;
    println!("Successfully fetched {} logs from queue", persisted);
    Ok(())
}

/// Deletes every stored event.
pub fn purge(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let connection_pool = create_shared_connection_pool(&config.database.url, 1)?;
    let dal = DAL::new(connection_pool.pool.clone());

    let deleted = query::purge(&dal)?;
    info!("Purged {} logs", deleted);
    println!("Successfully deleted {} logs", deleted);
    Ok(())
}

/// Prints aggregated counts.
pub fn stats(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let connection_pool = create_shared_connection_pool(&config.database.url, 1)?;
    let dal = DAL::new(connection_pool.pool.clone());

    let stats = query::stats(&dal)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
