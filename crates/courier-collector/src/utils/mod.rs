/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Utility functions for the log collector.

pub mod background_tasks;

use courier_utils::logging::prelude::*;
use tokio::signal;

/// Resolves once ctrl-c is received. Used as the HTTP server's graceful
/// shutdown signal.
pub async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            // keep serving rather than stopping on a broken signal handler
            std::future::pending::<()>().await
        }
    }
}
