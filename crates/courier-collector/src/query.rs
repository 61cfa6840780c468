/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Query and aggregation over persisted log events.

use crate::store::{LogStore, StoreError};
use chrono::{Datelike, Days, NaiveDate};
use courier_models::models::{LogStats, StoredLogEvent};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by the query layer.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Parses two `YYYY-MM-DD` dates.
    pub fn parse(from: &str, to: &str) -> Result<Self, QueryError> {
        Ok(DateRange {
            from: parse_date(from)?,
            to: parse_date(to)?,
        })
    }

    /// Lower and upper timestamp bounds of the half-open window
    /// `[from 00:00:00, day after to 00:00:00)`.
    ///
    /// This covers every instant of the last day, fractional seconds
    /// included. A range whose start is after its end yields an empty
    /// window.
    pub fn bounds(&self) -> (String, String) {
        let upper = self
            .to
            .checked_add_days(Days::new(1))
            // chrono writes years past 9999 as `+10000`, which sorts below `9`
            .filter(|day| day.year() <= 9999)
            .map(|day| format!("{}T00:00:00", day.format(DATE_FORMAT)))
            // no four-digit day after `to`; sort above any timestamp on it
            .unwrap_or_else(|| format!("{}U", self.to.format(DATE_FORMAT)));
        (format!("{}T00:00:00", self.from.format(DATE_FORMAT)), upper)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, QueryError> {
    // chrono accepts unpadded fields; the API only takes the strict form
    let well_formed = value.len() == 10
        && value
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
    if !well_formed {
        return Err(QueryError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| QueryError::InvalidDate(value.to_string()))
}

/// Events whose timestamp falls within `range`, newest first.
pub fn find_range(
    store: &dyn LogStore,
    range: &DateRange,
) -> Result<Vec<StoredLogEvent>, QueryError> {
    if range.from > range.to {
        return Ok(Vec::new());
    }
    let (lower, upper) = range.bounds();
    Ok(store.find_between(&lower, &upper)?)
}

/// Total and grouped counts over all events.
pub fn stats(store: &dyn LogStore) -> Result<LogStats, QueryError> {
    Ok(store.stats()?)
}

/// Deletes every event and returns how many were removed.
pub fn purge(store: &dyn LogStore) -> Result<usize, QueryError> {
    Ok(store.purge()?)
}
