/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data models for the log pipeline
pub mod log_events;
pub mod stats;

pub use log_events::{IncomingLogEvent, LogEvent, LogType, NewLogEvent, StoredLogEvent};
pub use stats::{GroupCount, LogStats};
