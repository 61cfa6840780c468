/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # AMQP Session
//!
//! [`AmqpSession`] owns one lapin connection and one channel on it. The pair is
//! opened lazily: the first operation that finds no live channel makes a
//! single connection attempt (declaring the topology for its role), and any
//! failed or stalled operation drops the pair so the next caller starts over.
//! There is no background reconnect loop.
//!
//! Every broker round-trip is bounded by the configured blocked-connection
//! timeout. The heartbeat interval is negotiated through the connection URI.
//! Channels run in publisher-confirm mode: a publish succeeds only once the
//! broker has acked it.

use crate::error::BrokerError;
use crate::message::{DeliverySource, EventPublisher, InboundMessage, Receipt};
use crate::topology::{Topology, TopologyRole};
use async_trait::async_trait;
use courier_utils::config::Amqp;
use lapin::options::{
    BasicAckOptions, BasicGetOptions, BasicNackOptions, BasicPublishOptions, ConfirmSelectOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::uri::AMQPUri;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;
const JSON_CONTENT_TYPE: &str = "application/json";

struct Link {
    connection: Connection,
    channel: Channel,
}

impl Link {
    fn is_open(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }
}

/// A lazily (re)connecting broker session for one process.
pub struct AmqpSession {
    uri: AMQPUri,
    connection_name: String,
    topology: Topology,
    role: TopologyRole,
    op_timeout: Duration,
    link: Mutex<Option<Link>>,
}

impl AmqpSession {
    /// Creates a session without touching the network.
    pub fn new(settings: &Amqp, role: TopologyRole) -> Result<Self, BrokerError> {
        let mut uri: AMQPUri = settings
            .url
            .parse()
            .map_err(|e: String| BrokerError::Connection(format!("invalid broker URL: {}", e)))?;
        uri.query.heartbeat = Some(settings.heartbeat_seconds);
        uri.query.connection_timeout = Some(
            settings
                .blocked_connection_timeout_seconds
                .saturating_mul(1000),
        );

        Ok(AmqpSession {
            uri,
            connection_name: settings.connection_name.clone(),
            topology: Topology::from_settings(settings),
            role,
            op_timeout: Duration::from_secs(settings.blocked_connection_timeout_seconds),
            link: Mutex::new(None),
        })
    }

    /// Creates a session and makes one connection attempt.
    ///
    /// An unreachable broker is logged and tolerated: the session stays
    /// disconnected and the next operation retries. A topology conflict on a
    /// reachable broker is returned as an error.
    pub async fn start(settings: &Amqp, role: TopologyRole) -> Result<Self, BrokerError> {
        let session = Self::new(settings, role)?;
        match session.channel().await {
            Ok(_) => Ok(session),
            Err(e @ BrokerError::Topology(_)) => Err(e),
            Err(e) => {
                warn!(
                    "Broker not reachable at startup, will retry on first use: {}",
                    e
                );
                Ok(session)
            }
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Returns the live channel, opening a new link first if needed.
    async fn channel(&self) -> Result<Channel, BrokerError> {
        let mut link = self.link.lock().await;
        if let Some(current) = link.as_ref() {
            if current.is_open() {
                return Ok(current.channel.clone());
            }
            debug!("Broker link is closed, reconnecting");
        }
        *link = None;

        let fresh = self.open().await?;
        let channel = fresh.channel.clone();
        *link = Some(fresh);
        Ok(channel)
    }

    async fn open(&self) -> Result<Link, BrokerError> {
        let properties =
            ConnectionProperties::default().with_connection_name(self.connection_name.clone().into());

        let connection = tokio::time::timeout(
            self.op_timeout,
            Connection::connect_uri(self.uri.clone(), properties),
        )
        .await
        .map_err(|_| BrokerError::Timeout("connect"))?
        .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let channel = tokio::time::timeout(self.op_timeout, connection.create_channel())
            .await
            .map_err(|_| BrokerError::Timeout("open channel"))?
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        tokio::time::timeout(
            self.op_timeout,
            channel.confirm_select(ConfirmSelectOptions::default()),
        )
        .await
        .map_err(|_| BrokerError::Timeout("confirm.select"))?
        .map_err(|e| BrokerError::Connection(e.to_string()))?;

        tokio::time::timeout(self.op_timeout, self.topology.declare(&channel, self.role))
            .await
            .map_err(|_| BrokerError::Timeout("declare topology"))??;

        info!(
            "Connected to broker ({:?} role, exchange '{}')",
            self.role, self.topology.exchange
        );
        Ok(Link {
            connection,
            channel,
        })
    }

    /// Drops the current link. The connection is closed in the background.
    pub async fn invalidate(&self) {
        if let Some(stale) = self.link.lock().await.take() {
            tokio::spawn(async move {
                let _ = stale.connection.close(200, "reconnecting").await;
            });
        }
    }

    /// Runs one broker round-trip under the blocked-connection timeout,
    /// dropping the link when it fails or stalls.
    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> Result<T, BrokerError>
    where
        F: Future<Output = lapin::Result<T>>,
    {
        let result = match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => BrokerError::Channel(format!("{}: {}", op, e)),
            Err(_) => BrokerError::Timeout(op),
        };
        self.invalidate().await;
        Err(result)
    }

    /// Closes the connection, if open.
    pub async fn close(&self) {
        if let Some(link) = self.link.lock().await.take() {
            if let Err(e) = link.connection.close(200, "shutdown").await {
                debug!("Error while closing broker connection: {}", e);
            }
        }
    }
}

/// Maps a publisher confirm onto the publish result.
fn confirmed(confirmation: Confirmation) -> Result<(), BrokerError> {
    match confirmation {
        Confirmation::Ack(_) => Ok(()),
        Confirmation::Nack(_) => Err(BrokerError::Channel(
            "publish was nacked by the broker".to_string(),
        )),
        Confirmation::NotRequested => Err(BrokerError::Channel(
            "publish confirms are not enabled on the channel".to_string(),
        )),
    }
}

#[async_trait]
impl EventPublisher for AmqpSession {
    async fn publish(&self, payload: &[u8]) -> Result<(), BrokerError> {
        let channel = self.channel().await?;
        let properties = BasicProperties::default()
            .with_delivery_mode(PERSISTENT)
            .with_content_type(JSON_CONTENT_TYPE.into());

        let confirm = self
            .guarded(
                "publish",
                channel.basic_publish(
                    &self.topology.exchange,
                    "",
                    BasicPublishOptions::default(),
                    payload,
                    properties,
                ),
            )
            .await?;
        let confirmation = self.guarded("publish confirm", confirm).await?;
        confirmed(confirmation)
    }

    async fn reconnect(&self) -> Result<(), BrokerError> {
        self.invalidate().await;
        self.channel().await.map(|_| ())
    }
}

#[async_trait]
impl DeliverySource for AmqpSession {
    async fn fetch(&self) -> Result<Option<InboundMessage>, BrokerError> {
        let channel = self.channel().await?;
        let message = self
            .guarded(
                "basic.get",
                channel.basic_get(&self.topology.queue, BasicGetOptions { no_ack: false }),
            )
            .await?;

        Ok(message.map(|m| {
            let delivery = m.delivery;
            InboundMessage {
                payload: delivery.data,
                redelivered: delivery.redelivered,
                receipt: Receipt::Amqp(delivery.acker),
            }
        }))
    }

    async fn ack(&self, message: InboundMessage) -> Result<(), BrokerError> {
        match message.receipt {
            Receipt::Amqp(acker) => {
                self.guarded("basic.ack", acker.ack(BasicAckOptions::default()))
                    .await
            }
            Receipt::Memory { .. } => Err(BrokerError::Channel(
                "message was not delivered by this session".to_string(),
            )),
        }
    }

    async fn requeue(&self, message: InboundMessage) -> Result<(), BrokerError> {
        match message.receipt {
            Receipt::Amqp(acker) => {
                self.guarded(
                    "basic.nack",
                    acker.nack(BasicNackOptions {
                        multiple: false,
                        requeue: true,
                    }),
                )
                .await
            }
            Receipt::Memory { .. } => Err(BrokerError::Channel(
                "message was not delivered by this session".to_string(),
            )),
        }
    }

    async fn is_connected(&self) -> bool {
        // a connect in progress holds the lock; report it as not yet connected
        match self.link.try_lock() {
            Ok(link) => link.as_ref().map(Link::is_open).unwrap_or(false),
            Err(_) => false,
        }
    }
}
