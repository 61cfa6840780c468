/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Courier AMQP
//!
//! Broker plumbing shared by log producers and the collector:
//!
//! - [`Topology`]: the durable fan-out exchange and its bound queue.
//! - [`AmqpSession`]: a lapin connection/channel pair that reconnects lazily.
//! - [`EventPublisher`] / [`DeliverySource`]: the seams the producer and the
//!   ingestion worker are written against.
//! - [`MemoryExchange`]: an in-process fan-out exchange with the same
//!   acknowledgement semantics, used by tests and local runs.

pub mod error;
pub mod memory;
pub mod message;
pub mod session;
pub mod topology;

pub use error::BrokerError;
pub use memory::{MemoryExchange, MemoryQueue};
pub use message::{DeliverySource, EventPublisher, InboundMessage};
pub use session::AmqpSession;
pub use topology::{Topology, TopologyRole};
