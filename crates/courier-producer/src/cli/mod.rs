/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

/// Command-line interface module for the courier demo producer.
pub mod commands;
use clap::{Parser, Subcommand};

/// CLI configuration structure.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional configuration file layered over the built-in defaults
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    pub config: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the instrumented demo service
    Serve,
}

/// Parses command-line arguments into the Cli structure.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
