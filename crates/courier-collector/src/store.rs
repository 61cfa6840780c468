/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Log store abstraction.
//!
//! The ingestion worker and the HTTP API are written against [`LogStore`].
//! [`crate::dal::DAL`] implements it on PostgreSQL; [`MemoryLogStore`] keeps
//! rows in process memory for tests and local runs.

use courier_models::models::{GroupCount, LogStats, NewLogEvent, StoredLogEvent};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Errors raised by the log store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database connection unavailable: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage of ingested log events.
pub trait LogStore: Send + Sync {
    /// Persists one event and returns the stored row.
    fn insert(&self, event: NewLogEvent) -> Result<StoredLogEvent, StoreError>;

    /// Events with `lower <= timestamp < upper`, newest first.
    ///
    /// Timestamps compare as strings, which matches chronological order for
    /// UTC ISO-8601 values.
    fn find_between(&self, lower: &str, upper: &str) -> Result<Vec<StoredLogEvent>, StoreError>;

    /// Total count plus counts grouped by service and by log type.
    fn stats(&self) -> Result<LogStats, StoreError>;

    /// Deletes every event and returns how many were removed.
    fn purge(&self) -> Result<usize, StoreError>;

    /// Checks that the store is reachable.
    fn ping(&self) -> Result<(), StoreError>;
}

/// A [`LogStore`] holding rows in memory.
#[derive(Default)]
pub struct MemoryLogStore {
    rows: Mutex<Vec<StoredLogEvent>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of all rows in insertion order.
    pub fn rows(&self) -> Vec<StoredLogEvent> {
        self.lock().clone()
    }

    fn enter(&self) -> Result<MutexGuard<'_, Vec<StoredLogEvent>>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredLogEvent>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn group_counts<'a>(keys: impl Iterator<Item = Option<&'a str>>) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = Vec::new();
    for key in keys {
        match groups.iter_mut().find(|g| g.key.as_deref() == key) {
            Some(group) => group.count += 1,
            None => groups.push(GroupCount {
                key: key.map(str::to_string),
                count: 1,
            }),
        }
    }
    groups
}

impl LogStore for MemoryLogStore {
    fn insert(&self, event: NewLogEvent) -> Result<StoredLogEvent, StoreError> {
        let mut rows = self.enter()?;
        let stored = StoredLogEvent::from_new(Uuid::new_v4(), event);
        rows.push(stored.clone());
        Ok(stored)
    }

    fn find_between(&self, lower: &str, upper: &str) -> Result<Vec<StoredLogEvent>, StoreError> {
        let rows = self.enter()?;
        let mut found: Vec<StoredLogEvent> = rows
            .iter()
            .filter(|row| {
                row.timestamp
                    .as_deref()
                    .map(|ts| ts >= lower && ts < upper)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.retrieved_at.cmp(&a.retrieved_at))
        });
        Ok(found)
    }

    fn stats(&self) -> Result<LogStats, StoreError> {
        let rows = self.enter()?;
        Ok(LogStats {
            total_logs: rows.len() as i64,
            by_service: group_counts(rows.iter().map(|r| r.service_name.as_deref())),
            by_type: group_counts(rows.iter().map(|r| r.log_type.as_deref())),
        })
    }

    fn purge(&self) -> Result<usize, StoreError> {
        let mut rows = self.enter()?;
        let deleted = rows.len();
        rows.clear();
        Ok(deleted)
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.enter().map(|_| ())
    }
}
