/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Log event models.
//!
//! A [`LogEvent`] is built once per completed request by an instrumented
//! service and travels over the broker as JSON. The collector reads it back
//! leniently as an [`IncomingLogEvent`], stamps the ingestion time and stores
//! it as a [`NewLogEvent`]. Rows read back from storage are [`StoredLogEvent`]s.
//!
//! Stored rows are never updated; they are only removed by a bulk purge.

use crate::schema::log_events;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Severity of a log event, derived from the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    Info,
    Error,
}

impl LogType {
    /// `Error` for any status of 400 or above, `Info` otherwise.
    pub fn for_status(status: u16) -> Self {
        if status >= 400 {
            LogType::Error
        } else {
            LogType::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Info => "INFO",
            LogType::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event published by an instrumented service for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Producer-side creation time, RFC 3339 UTC with milliseconds.
    pub timestamp: String,
    pub log_type: LogType,
    /// Fully qualified request URL.
    pub url: String,
    pub correlation_id: String,
    pub service_name: String,
    /// `"{METHOD} {path} - {status} ({duration}ms)"`
    pub message: String,
    pub method: String,
    pub status_code: u16,
    /// Request processing time in milliseconds.
    pub duration: u64,
}

impl LogEvent {
    /// Serializes the event into the broker message body.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A log event as read off the queue.
///
/// Every field is optional and no field can make a JSON object unreadable.
/// Text fields keep whatever value they carry: strings as-is, other values
/// as their JSON text. Numeric fields accept integers, integral floats and
/// numeric strings; anything else is stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingLogEvent {
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub log_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub correlation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub status_code: Option<i32>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub duration: Option<i64>,
}

impl IncomingLogEvent {
    /// Parses a message body. Anything but a JSON object is rejected.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let object: serde_json::Map<String, Value> = serde_json::from_slice(payload)?;
        serde_json::from_value(Value::Object(object))
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(number.and_then(|n| T::try_from(n).ok()))
}

impl From<LogEvent> for IncomingLogEvent {
    fn from(event: LogEvent) -> Self {
        IncomingLogEvent {
            timestamp: Some(event.timestamp),
            log_type: Some(event.log_type.as_str().to_string()),
            url: Some(event.url),
            correlation_id: Some(event.correlation_id),
            service_name: Some(event.service_name),
            message: Some(event.message),
            method: Some(event.method),
            status_code: Some(i32::from(event.status_code)),
            duration: i64::try_from(event.duration).ok(),
        }
    }
}

/// A log event ready to be inserted.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = log_events)]
pub struct NewLogEvent {
    pub timestamp: Option<String>,
    pub log_type: Option<String>,
    pub url: Option<String>,
    pub correlation_id: Option<String>,
    pub service_name: Option<String>,
    pub message: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i32>,
    pub duration: Option<i64>,
    pub retrieved_at: DateTime<Utc>,
}

impl NewLogEvent {
    /// Creates a new row from an ingested event and the time it was retrieved.
    pub fn new(event: IncomingLogEvent, retrieved_at: DateTime<Utc>) -> Self {
        NewLogEvent {
            timestamp: event.timestamp,
            log_type: event.log_type,
            url: event.url,
            correlation_id: event.correlation_id,
            service_name: event.service_name,
            message: event.message,
            method: event.method,
            status_code: event.status_code,
            duration: event.duration,
            retrieved_at,
        }
    }
}

/// A persisted log event.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = log_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct StoredLogEvent {
    /// Storage-assigned identifier.
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub timestamp: Option<String>,
    pub log_type: Option<String>,
    pub url: Option<String>,
    pub correlation_id: Option<String>,
    pub service_name: Option<String>,
    pub message: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i32>,
    pub duration: Option<i64>,
    /// Set by the collector when the event was taken off the queue.
    pub retrieved_at: DateTime<Utc>,
}

impl StoredLogEvent {
    /// Builds the stored form of a new row under the given identifier.
    pub fn from_new(id: Uuid, row: NewLogEvent) -> Self {
        StoredLogEvent {
            id,
            timestamp: row.timestamp,
            log_type: row.log_type,
            url: row.url,
            correlation_id: row.correlation_id,
            service_name: row.service_name,
            message: row.message,
            method: row.method,
            status_code: row.status_code,
            duration: row.duration,
            retrieved_at: row.retrieved_at,
        }
    }
}
