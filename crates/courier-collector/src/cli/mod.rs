/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// Courier Collector CLI
///
/// This CLI serves the log collector API and runs one-off maintenance
/// commands against the log store.
pub struct Cli {
    /// Optional configuration file layered over the built-in defaults
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the collector HTTP API (and the periodic drain, if configured)
    Serve,

    /// Run one drain pass and print the number of persisted events
    Drain,

    /// Delete every stored log event
    Purge,

    /// Print aggregated log counts as JSON
    Stats,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
