/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

/// Errors raised by broker operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// The broker could not be reached or the connection was refused.
    #[error("broker connection failed: {0}")]
    Connection(String),
    /// Declaring the exchange, queue or binding was rejected.
    #[error("broker topology declaration failed: {0}")]
    Topology(String),
    /// An operation on an open channel failed.
    #[error("broker channel error: {0}")]
    Channel(String),
    /// An operation stalled longer than the blocked-connection timeout.
    #[error("broker operation '{0}' timed out")]
    Timeout(&'static str),
    /// No usable channel and none could be opened.
    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

impl BrokerError {
    /// Whether the error means the broker is currently unreachable, as
    /// opposed to a misconfiguration.
    pub fn is_connectivity(&self) -> bool {
        !matches!(self, BrokerError::Topology(_))
    }
}
