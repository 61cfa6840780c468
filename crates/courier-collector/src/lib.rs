/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Courier Collector
//!
//! `courier-collector` drains request log events from the broker queue into
//! PostgreSQL and serves them back over HTTP: range queries by calendar day,
//! aggregated counts, a full purge and a health report covering the store
//! and the broker.

pub mod api;
pub mod cli;
pub mod dal;
pub mod db;
pub mod ingest;
pub mod metrics;
pub mod query;
pub mod store;
pub mod utils;
