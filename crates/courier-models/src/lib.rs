/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Shared data model of the courier log pipeline: the wire event emitted by
//! instrumented services and the persisted rows written by the collector.

pub mod models;
pub mod schema;
