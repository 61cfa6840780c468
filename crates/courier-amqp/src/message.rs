/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Publisher and delivery-source seams.
//!
//! Producers depend on [`EventPublisher`] and the ingestion worker on
//! [`DeliverySource`], so both can run against a live broker
//! ([`crate::AmqpSession`]) or the in-process [`crate::MemoryExchange`].

use crate::error::BrokerError;
use async_trait::async_trait;

/// A message taken off a queue and not yet acknowledged.
///
/// Dropping an `InboundMessage` without settling it leaves it unacknowledged;
/// the broker redelivers it once the channel goes away.
#[derive(Debug)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    /// Set when the broker has delivered this message before.
    pub redelivered: bool,
    pub(crate) receipt: Receipt,
}

#[derive(Debug)]
pub(crate) enum Receipt {
    Amqp(lapin::acker::Acker),
    Memory { queue: String, tag: u64 },
}

/// Publishes serialized events to the fan-out exchange.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one persistent JSON message.
    async fn publish(&self, payload: &[u8]) -> Result<(), BrokerError>;

    /// Drops the current link, if any, and makes one attempt to open a new one.
    async fn reconnect(&self) -> Result<(), BrokerError>;
}

/// Pull-based access to the bound queue, without auto-acknowledgement.
#[async_trait]
pub trait DeliverySource: Send + Sync {
    /// Fetches the next ready message, or `None` when the queue is empty.
    async fn fetch(&self) -> Result<Option<InboundMessage>, BrokerError>;

    /// Positively acknowledges a fetched message.
    async fn ack(&self, message: InboundMessage) -> Result<(), BrokerError>;

    /// Negatively acknowledges a fetched message and puts it back on the queue.
    async fn requeue(&self, message: InboundMessage) -> Result<(), BrokerError>;

    /// Reports whether a live channel is currently open. Never connects.
    async fn is_connected(&self) -> bool;
}
