/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Background tasks for the log collector.

use crate::ingest::Ingestor;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Configuration for the periodic drain task.
pub struct PeriodicDrainConfig {
    /// How often to run a drain pass (in seconds). Zero disables the task.
    pub interval_seconds: u64,
}

/// Starts the periodic drain task.
///
/// Each tick runs one ordinary drain pass, so passes triggered over HTTP and
/// by the timer never overlap and keep the same acknowledgement rules.
///
/// # Returns
/// The task handle, or `None` when the task is disabled.
pub fn start_periodic_drain_task(
    ingestor: Arc<Ingestor>,
    config: PeriodicDrainConfig,
) -> Option<JoinHandle<()>> {
    if config.interval_seconds == 0 {
        debug!("Periodic drain disabled");
        return None;
    }
    info!(
        "Starting periodic drain task (interval: {}s)",
        config.interval_seconds
    );

    Some(tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match ingestor.drain().await {
                Ok(persisted) => {
                    if persisted > 0 {
                        info!("Periodic drain persisted {} log events", persisted);
                    }
                }
                Err(e) => {
                    warn!("Periodic drain failed: {}", e);
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;
    use courier_amqp::{EventPublisher, MemoryExchange};

    #[tokio::test]
    async fn test_disabled_task_is_not_spawned() {
        let exchange = MemoryExchange::new();
        let ingestor = Arc::new(Ingestor::new(
            Arc::new(exchange.bind_queue("logs_queue")),
            Arc::new(MemoryLogStore::new()),
        ));
        assert!(start_periodic_drain_task(ingestor, PeriodicDrainConfig { interval_seconds: 0 })
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_task_drains_queue() {
        let exchange = MemoryExchange::new();
        let store = Arc::new(MemoryLogStore::new());
        let ingestor = Arc::new(Ingestor::new(
            Arc::new(exchange.bind_queue("logs_queue")),
            store.clone(),
        ));
        exchange
            .publish(br#"{"serviceName":"delivery-service","logType":"INFO"}"#)
            .await
            .unwrap();

        let handle =
            start_periodic_drain_task(ingestor, PeriodicDrainConfig { interval_seconds: 5 })
                .expect("task should start");
        // the first tick fires immediately
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.rows().len(), 1);
        handle.abort();
    }
}
