/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Broker topology.
//!
//! One durable fan-out exchange per deployment with exactly one durable queue
//! bound to it under an empty routing key. Declarations are idempotent on the
//! broker side; a declaration that conflicts with an existing exchange or
//! queue is rejected by the broker and surfaces as [`BrokerError::Topology`].

use crate::error::BrokerError;
use courier_utils::config::Amqp;
use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tracing::debug;

/// Which part of the topology a process declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyRole {
    /// Publishers only need the exchange.
    Producer,
    /// The collector declares the exchange, the queue and the binding.
    Collector,
}

/// Names of the exchange and queue making up the pipeline topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub queue: String,
}

impl Topology {
    pub fn new(exchange: impl Into<String>, queue: impl Into<String>) -> Self {
        Topology {
            exchange: exchange.into(),
            queue: queue.into(),
        }
    }

    pub fn from_settings(settings: &Amqp) -> Self {
        Topology::new(settings.exchange.clone(), settings.queue.clone())
    }

    /// Declares the part of the topology owned by `role` on `channel`.
    pub(crate) async fn declare(
        &self,
        channel: &Channel,
        role: TopologyRole,
    ) -> Result<(), BrokerError> {
        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                BrokerError::Topology(format!("exchange '{}': {}", self.exchange, e))
            })?;
        debug!("Declared fanout exchange '{}'", self.exchange);

        if role == TopologyRole::Producer {
            return Ok(());
        }

        channel
            .queue_declare(
                &self.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| BrokerError::Topology(format!("queue '{}': {}", self.queue, e)))?;

        channel
            .queue_bind(
                &self.queue,
                &self.exchange,
                "",
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                BrokerError::Topology(format!(
                    "binding '{}' -> '{}': {}",
                    self.exchange, self.queue, e
                ))
            })?;
        debug!(
            "Declared durable queue '{}' bound to '{}'",
            self.queue, self.exchange
        );

        Ok(())
    }
}
