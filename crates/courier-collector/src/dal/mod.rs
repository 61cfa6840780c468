/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for the collector.
//!
//! [`DAL`] owns the connection pool and hands out per-table accessors. It
//! also implements [`LogStore`] so the ingestion worker and the API can run
//! against PostgreSQL without knowing about diesel.

use crate::store::{LogStore, StoreError};
use courier_models::models::{LogStats, NewLogEvent, StoredLogEvent};
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::PgConnection;

mod log_events;

pub use log_events::LogEventsDAL;

/// The main Data Access Layer struct.
#[derive(Clone)]
pub struct DAL {
    /// A connection pool for PostgreSQL database connections.
    pub pool: Pool<ConnectionManager<PgConnection>>,
}

impl DAL {
    /// Creates a new DAL instance with the given connection pool.
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        DAL { pool }
    }

    /// Provides access to the log events Data Access Layer.
    pub fn log_events(&self) -> LogEventsDAL<'_> {
        LogEventsDAL { dal: self }
    }

    pub(crate) fn connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl LogStore for DAL {
    fn insert(&self, event: NewLogEvent) -> Result<StoredLogEvent, StoreError> {
        self.log_events().create(&event)
    }

    fn find_between(&self, lower: &str, upper: &str) -> Result<Vec<StoredLogEvent>, StoreError> {
        self.log_events().list_between(lower, upper)
    }

    fn stats(&self) -> Result<LogStats, StoreError> {
        let log_events = self.log_events();
        Ok(LogStats {
            total_logs: log_events.count()?,
            by_service: log_events.count_by_service()?,
            by_type: log_events.count_by_type()?,
        })
    }

    fn purge(&self) -> Result<usize, StoreError> {
        self.log_events().delete_all()
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.log_events().ping()
    }
}
