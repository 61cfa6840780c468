/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Log event producer.
//!
//! [`LogProducer::record`] builds the event for a finished request, writes the
//! local log line and queues the event without waiting. A single dispatcher
//! task drains the queue and publishes events in arrival order.
//!
//! Publishing is best-effort. When a publish fails the failure is logged, the
//! broker link is rebuilt once so later requests find a live channel, and the
//! failed event is dropped. A full queue drops the event with a warning.

use axum::http::{Method, StatusCode};
use chrono::{SecondsFormat, Utc};
use courier_amqp::{BrokerError, EventPublisher};
use courier_models::models::{LogEvent, LogType};
use courier_utils::config::Producer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::context::RequestContext;

/// Identity stamped on every event a service emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub service_name: String,
    /// Public base URL; the request path is appended to form the event URL.
    pub base_url: String,
}

impl ServiceIdentity {
    pub fn new(service_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        ServiceIdentity {
            service_name: service_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Producer) -> Self {
        Self::new(settings.service_name.clone(), settings.base_url.clone())
    }
}

/// Builds the event describing one finished request.
pub fn build_event(
    identity: &ServiceIdentity,
    context: &RequestContext,
    method: &Method,
    path: &str,
    status: StatusCode,
) -> LogEvent {
    let duration = context.elapsed_ms();
    let status_code = status.as_u16();

    LogEvent {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        log_type: LogType::for_status(status_code),
        url: format!("{}{}", identity.base_url, path),
        correlation_id: context.correlation_id.clone(),
        service_name: identity.service_name.clone(),
        message: format!("{} {} - {} ({}ms)", method, path, status_code, duration),
        method: method.to_string(),
        status_code,
        duration,
    }
}

/// Local log line written for every event.
pub fn local_line(event: &LogEvent) -> String {
    format!(
        "{} {} {} Correlation: {} [{}] - {}",
        event.timestamp,
        event.log_type,
        event.url,
        event.correlation_id,
        event.service_name,
        event.message
    )
}

/// Handle to the producer. Cheap to clone.
#[derive(Clone)]
pub struct LogProducer {
    sender: mpsc::Sender<LogEvent>,
    identity: Arc<ServiceIdentity>,
}

impl LogProducer {
    /// Creates a producer and starts its dispatcher task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        identity: ServiceIdentity,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(dispatch(publisher, receiver));
        info!(
            "Log producer started for '{}' with queue capacity {}",
            identity.service_name, capacity
        );

        LogProducer {
            sender,
            identity: Arc::new(identity),
        }
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// Records a finished request: logs it locally and queues its event.
    pub fn record(&self, context: &RequestContext, method: &Method, path: &str, status: StatusCode) {
        let event = build_event(&self.identity, context, method, path, status);
        info!("{}", local_line(&event));
        self.emit(event);
    }

    /// Queues an event for publishing without waiting.
    pub fn emit(&self, event: LogEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(
                    "Log producer queue full, dropping event (correlation: {})",
                    event.correlation_id
                );
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(
                    "Log producer stopped, dropping event (correlation: {})",
                    event.correlation_id
                );
            }
        }
    }
}

async fn dispatch(publisher: Arc<dyn EventPublisher>, mut receiver: mpsc::Receiver<LogEvent>) {
    while let Some(event) = receiver.recv().await {
        publish_event(publisher.as_ref(), &event).await;
    }
    debug!("Log producer dispatcher stopped");
}

/// Publishes one event, rebuilding the broker link once on failure.
///
/// Returns whether the event reached the broker.
pub async fn publish_event(publisher: &dyn EventPublisher, event: &LogEvent) -> bool {
    let payload = match event.to_payload() {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to serialize log event: {}", e);
            return false;
        }
    };

    match publisher.publish(&payload).await {
        Ok(()) => {
            debug!("Published log event (correlation: {})", event.correlation_id);
            true
        }
        Err(e) => {
            error!(
                "Failed to publish log event (correlation: {}): {}",
                event.correlation_id, e
            );
            reconnect(publisher).await;
            false
        }
    }
}

async fn reconnect(publisher: &dyn EventPublisher) {
    match publisher.reconnect().await {
        Ok(()) => info!("Reconnected to broker"),
        Err(BrokerError::Topology(e)) => error!("Broker topology rejected on reconnect: {}", e),
        Err(e) => warn!("Broker reconnect failed: {}", e),
    }
}
