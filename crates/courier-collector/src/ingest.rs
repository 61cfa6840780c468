/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Log ingestion worker.
//!
//! A drain pass pulls messages off the bound queue one at a time. Each message
//! is parsed, stamped with the ingestion time, persisted and only then
//! acknowledged. Any JSON object parses; unexpected field values are kept or
//! nulled, never rejected. The first message that is not a JSON object or
//! cannot be stored is requeued and ends the pass, so a poison message stays
//! at the head of the queue until it is removed by hand.

use crate::metrics;
use crate::store::LogStore;
use chrono::Utc;
use courier_amqp::{BrokerError, DeliverySource, InboundMessage};
use courier_models::models::{IncomingLogEvent, NewLogEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Errors that abort a drain pass before anything was persisted.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("broker unavailable: {0}")]
    Broker(#[from] BrokerError),
}

/// How a drain pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOutcome {
    /// The queue was empty.
    Completed,
    /// A message was requeued or could not be settled.
    Halted,
}

impl PassOutcome {
    fn label(&self) -> &'static str {
        match self {
            PassOutcome::Completed => "completed",
            PassOutcome::Halted => "halted",
        }
    }
}

/// Drains the log queue into a [`LogStore`].
pub struct Ingestor {
    source: Arc<dyn DeliverySource>,
    store: Arc<dyn LogStore>,
    // one pass at a time per process
    pass_lock: Mutex<()>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn DeliverySource>, store: Arc<dyn LogStore>) -> Self {
        Ingestor {
            source,
            store,
            pass_lock: Mutex::new(()),
        }
    }

    /// Whether the delivery source currently holds a live channel.
    pub async fn broker_connected(&self) -> bool {
        self.source.is_connected().await
    }

    /// Runs one drain pass and returns the number of events persisted.
    ///
    /// A pass that cannot reach the broker for its first fetch fails with
    /// [`IngestError::Broker`]. Losing the broker later in the pass keeps the
    /// events already persisted and returns their count.
    pub async fn drain(&self) -> Result<usize, IngestError> {
        let _pass = self.pass_lock.lock().await;
        let mut persisted = 0;

        let outcome = loop {
            let message = match self.source.fetch().await {
                Ok(Some(message)) => message,
                Ok(None) => break PassOutcome::Completed,
                Err(e) if persisted == 0 => {
                    error!("Drain pass failed before the first message: {}", e);
                    metrics::DRAIN_PASSES_TOTAL
                        .with_label_values(&["failed"])
                        .inc();
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(
                        "Lost the broker after persisting {} events, ending pass: {}",
                        persisted, e
                    );
                    break PassOutcome::Halted;
                }
            };

            let redelivered = message.redelivered;
            if let Err(reason) = self.persist(&message) {
                warn!("Requeueing message and halting drain pass: {}", reason);
                self.requeue(message).await;
                break PassOutcome::Halted;
            }

            // counted even if the ack is lost: the row exists and a redelivery
            // will store it again
            persisted += 1;
            metrics::LOG_EVENTS_PERSISTED_TOTAL.inc();
            if redelivered {
                debug!("Persisted a redelivered message; a duplicate row may exist");
            }

            if let Err(e) = self.source.ack(message).await {
                warn!("Failed to acknowledge a persisted message, ending pass: {}", e);
                break PassOutcome::Halted;
            }
        };

        metrics::DRAIN_PASSES_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        info!(
            "Drain pass {} after persisting {} events",
            outcome.label(),
            persisted
        );
        Ok(persisted)
    }

    fn persist(&self, message: &InboundMessage) -> Result<(), String> {
        let event = IncomingLogEvent::from_payload(&message.payload)
            .map_err(|e| format!("malformed log event: {}", e))?;
        let row = NewLogEvent::new(event, Utc::now());
        self.store
            .insert(row)
            .map(|_| ())
            .map_err(|e| format!("failed to store log event: {}", e))
    }

    async fn requeue(&self, message: InboundMessage) {
        match self.source.requeue(message).await {
            Ok(()) => metrics::LOG_EVENTS_REQUEUED_TOTAL.inc(),
            // an unsettled message goes back to the queue when the channel closes
            Err(e) => error!("Failed to requeue message: {}", e),
        }
    }
}
