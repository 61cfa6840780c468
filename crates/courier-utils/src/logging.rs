/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Courier Logging Module
//!
//! A lightweight `log` facade backend used by the one-shot CLI commands
//! (`drain`, `purge`, `stats`). Long-running servers install the tracing
//! subscriber from [`crate::telemetry`] instead, which also captures records
//! emitted through the `log` macros.
//!
//! ## Usage
//!
//! ```ignore
//! use courier_utils::logging::prelude::*;
//!
//! courier_utils::logging::init_with_format("info", "json")?;
//! info!("drained {} events", count);
//! ```

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU8, Ordering};

static LOGGER: CourierLogger = CourierLogger;
static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(LevelFilter::Info as u8);
static FORMAT: AtomicU8 = AtomicU8::new(LogFormat::Text as u8);
static INSTALLED: OnceCell<Result<(), String>> = OnceCell::new();

/// Output format of the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogFormat {
    Text = 0,
    Json = 1,
}

impl LogFormat {
    /// Parses "json" (any case) as JSON; anything else is text.
    pub fn parse(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    fn current() -> Self {
        match FORMAT.load(Ordering::Relaxed) {
            1 => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// `log` backend writing one line per record to stderr.
struct CourierLogger;

impl CourierLogger {
    fn render(record: &Record) -> String {
        match LogFormat::current() {
            LogFormat::Json => serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "level": record.level().as_str().to_lowercase(),
                "target": record.target(),
                "message": record.args().to_string(),
                "file": record.file(),
                "line": record.line(),
            })
            .to_string(),
            LogFormat::Text => format!(
                "{} - {} - {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                record.level(),
                record.args()
            ),
        }
    }
}

impl log::Log for CourierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= current_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", Self::render(record));
        }
    }

    fn flush(&self) {}
}

/// Installs the logger with the given level and output format ("text" or "json").
///
/// Calling this again only updates the level and format. An unknown level
/// falls back to `info`.
pub fn init_with_format(level: &str, format: &str) -> Result<(), SetLoggerError> {
    let installed = INSTALLED.get_or_init(|| {
        log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(LevelFilter::Trace))
            .map_err(|e| e.to_string())
    });
    if installed.is_err() {
        // another backend (e.g. the tracing bridge) owns the facade; keep it
        return log::set_logger(&LOGGER);
    }

    FORMAT.store(LogFormat::parse(format) as u8, Ordering::Relaxed);
    set_level(parse_level(level));
    Ok(())
}

fn set_level(filter: LevelFilter) {
    CURRENT_LEVEL.store(filter as u8, Ordering::Relaxed);
    log::set_max_level(filter);
}

fn current_level() -> LevelFilter {
    match CURRENT_LEVEL.load(Ordering::Relaxed) {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        other => other
            .parse::<Level>()
            .map(|l| l.to_level_filter())
            .unwrap_or(LevelFilter::Info),
    }
}

pub mod prelude {
    pub use log::{debug, error, info, trace, warn};
}
