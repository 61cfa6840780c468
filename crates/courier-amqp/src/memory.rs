/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! In-process fan-out exchange.
//!
//! Mirrors the broker behaviour the pipeline relies on: every publish is
//! copied to each bound queue, fetched messages stay unacknowledged until
//! settled, a requeued message goes back to the head of its queue marked as
//! redelivered, and losing the connection returns every unacknowledged
//! message to its queue.

use crate::error::BrokerError;
use crate::message::{DeliverySource, EventPublisher, InboundMessage, Receipt};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct QueueState {
    ready: VecDeque<(Vec<u8>, bool)>,
    unacked: BTreeMap<u64, Vec<u8>>,
}

struct ExchangeState {
    connected: bool,
    next_tag: u64,
    queues: HashMap<String, QueueState>,
    publish_attempts: usize,
    reconnect_attempts: usize,
}

impl ExchangeState {
    fn recover(&mut self) {
        for queue in self.queues.values_mut() {
            let unacked = std::mem::take(&mut queue.unacked);
            // restore original order ahead of anything still ready
            for (_, payload) in unacked.into_iter().rev() {
                queue.ready.push_front((payload, true));
            }
        }
    }
}

/// A fan-out exchange living in process memory.
#[derive(Clone)]
pub struct MemoryExchange {
    state: Arc<Mutex<ExchangeState>>,
}

impl Default for MemoryExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryExchange {
    pub fn new() -> Self {
        MemoryExchange {
            state: Arc::new(Mutex::new(ExchangeState {
                connected: true,
                next_tag: 1,
                queues: HashMap::new(),
                publish_attempts: 0,
                reconnect_attempts: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExchangeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Declares `name` and binds it to the exchange. Declaring an existing
    /// queue again is a no-op.
    pub fn bind_queue(&self, name: &str) -> MemoryQueue {
        self.lock().queues.entry(name.to_string()).or_default();
        MemoryQueue {
            exchange: self.clone(),
            name: name.to_string(),
        }
    }

    /// Simulates losing or regaining the broker. Going down returns every
    /// unacknowledged message to its queue.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.lock();
        if state.connected && !connected {
            state.recover();
        }
        state.connected = connected;
    }

    /// Returns all unacknowledged messages to their queues, as a broker does
    /// when a consumer's channel closes.
    pub fn recover(&self) {
        self.lock().recover();
    }

    /// Messages waiting to be fetched from `queue`.
    pub fn ready_count(&self, queue: &str) -> usize {
        self.lock().queues.get(queue).map(|q| q.ready.len()).unwrap_or(0)
    }

    /// Messages fetched from `queue` and not yet settled.
    pub fn unacked_count(&self, queue: &str) -> usize {
        self.lock()
            .queues
            .get(queue)
            .map(|q| q.unacked.len())
            .unwrap_or(0)
    }

    pub fn publish_attempts(&self) -> usize {
        self.lock().publish_attempts
    }

    pub fn reconnect_attempts(&self) -> usize {
        self.lock().reconnect_attempts
    }
}

#[async_trait]
impl EventPublisher for MemoryExchange {
    async fn publish(&self, payload: &[u8]) -> Result<(), BrokerError> {
        let mut state = self.lock();
        state.publish_attempts += 1;
        if !state.connected {
            return Err(BrokerError::Unavailable("channel closed".to_string()));
        }
        for queue in state.queues.values_mut() {
            queue.ready.push_back((payload.to_vec(), false));
        }
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), BrokerError> {
        let mut state = self.lock();
        state.reconnect_attempts += 1;
        if state.connected {
            Ok(())
        } else {
            Err(BrokerError::Connection("connection refused".to_string()))
        }
    }
}

/// A queue bound to a [`MemoryExchange`].
#[derive(Clone)]
pub struct MemoryQueue {
    exchange: MemoryExchange,
    name: String,
}

impl MemoryQueue {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn settle(&self, message: InboundMessage, requeue: bool) -> Result<(), BrokerError> {
        let mut state = self.exchange.lock();
        if !state.connected {
            return Err(BrokerError::Unavailable("channel closed".to_string()));
        }
        let tag = match message.receipt {
            Receipt::Memory { queue, tag } if queue == self.name => tag,
            _ => {
                return Err(BrokerError::Channel(format!(
                    "message was not delivered by queue '{}'",
                    self.name
                )))
            }
        };

        let queue = state.queues.entry(self.name.clone()).or_default();
        let payload = queue
            .unacked
            .remove(&tag)
            .ok_or_else(|| BrokerError::Channel(format!("unknown delivery tag {}", tag)))?;
        if requeue {
            queue.ready.push_front((payload, true));
        }
        Ok(())
    }
}

#[async_trait]
impl DeliverySource for MemoryQueue {
    async fn fetch(&self) -> Result<Option<InboundMessage>, BrokerError> {
        let mut state = self.exchange.lock();
        if !state.connected {
            return Err(BrokerError::Unavailable("channel closed".to_string()));
        }
        let tag = state.next_tag;
        let queue = state.queues.entry(self.name.clone()).or_default();
        let Some((payload, redelivered)) = queue.ready.pop_front() else {
            return Ok(None);
        };
        queue.unacked.insert(tag, payload.clone());
        state.next_tag += 1;

        Ok(Some(InboundMessage {
            payload,
            redelivered,
            receipt: Receipt::Memory {
                queue: self.name.clone(),
                tag,
            },
        }))
    }

    async fn ack(&self, message: InboundMessage) -> Result<(), BrokerError> {
        self.settle(message, false)
    }

    async fn requeue(&self, message: InboundMessage) -> Result<(), BrokerError> {
        self.settle(message, true)
    }

    async fn is_connected(&self) -> bool {
        self.exchange.lock().connected
    }
}
