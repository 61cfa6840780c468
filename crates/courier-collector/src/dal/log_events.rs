/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for log event operations.
//!
//! Covers inserting ingested events, range reads over the event timestamp,
//! the grouped counts behind the stats endpoint and the full purge.

use crate::dal::DAL;
use crate::store::StoreError;
use courier_models::models::{GroupCount, NewLogEvent, StoredLogEvent};
use courier_models::schema::log_events;
use diesel::dsl::count_star;
use diesel::prelude::*;

/// Data Access Layer for log event operations.
pub struct LogEventsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl LogEventsDAL<'_> {
    /// Inserts one log event and returns the stored row, including its
    /// generated id.
    pub fn create(&self, new_event: &NewLogEvent) -> Result<StoredLogEvent, StoreError> {
        let conn = &mut self.dal.connection()?;
        let stored = diesel::insert_into(log_events::table)
            .values(new_event)
            .returning(StoredLogEvent::as_returning())
            .get_result(conn)?;
        Ok(stored)
    }

    /// Lists events whose timestamp falls in `[lower, upper)`, newest first.
    ///
    /// Events without a timestamp never match.
    pub fn list_between(&self, lower: &str, upper: &str) -> Result<Vec<StoredLogEvent>, StoreError> {
        let conn = &mut self.dal.connection()?;
        let rows = log_events::table
            .filter(log_events::timestamp.ge(lower))
            .filter(log_events::timestamp.lt(upper))
            .order((log_events::timestamp.desc(), log_events::retrieved_at.desc()))
            .select(StoredLogEvent::as_select())
            .load(conn)?;
        Ok(rows)
    }

    /// Counts all stored events.
    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = &mut self.dal.connection()?;
        Ok(log_events::table.count().get_result(conn)?)
    }

    /// Counts events per service name. Events without one are grouped under
    /// a `None` key.
    pub fn count_by_service(&self) -> Result<Vec<GroupCount>, StoreError> {
        let conn = &mut self.dal.connection()?;
        let rows = log_events::table
            .group_by(log_events::service_name)
            .select((log_events::service_name, count_star()))
            .order(log_events::service_name.asc())
            .load::<(Option<String>, i64)>(conn)?;
        Ok(into_groups(rows))
    }

    /// Counts events per log type.
    pub fn count_by_type(&self) -> Result<Vec<GroupCount>, StoreError> {
        let conn = &mut self.dal.connection()?;
        let rows = log_events::table
            .group_by(log_events::log_type)
            .select((log_events::log_type, count_star()))
            .order(log_events::log_type.asc())
            .load::<(Option<String>, i64)>(conn)?;
        Ok(into_groups(rows))
    }

    /// Deletes every stored event.
    ///
    /// # Returns
    ///
    /// The number of deleted rows.
    pub fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = &mut self.dal.connection()?;
        Ok(diesel::delete(log_events::table).execute(conn)?)
    }

    /// Round-trips a trivial query to confirm the database is reachable.
    pub fn ping(&self) -> Result<(), StoreError> {
        let conn = &mut self.dal.connection()?;
        diesel::sql_query("SELECT 1").execute(conn)?;
        Ok(())
    }
}

fn into_groups(rows: Vec<(Option<String>, i64)>) -> Vec<GroupCount> {
    rows.into_iter()
        .map(|(key, count)| GroupCount { key, count })
        .collect()
}
