/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Courier Collector CLI application
//!
//! Serves the log API or runs a one-off drain, purge or stats command.

use courier_collector::cli::{commands, parse_cli, Commands};
use courier_utils::config::Settings;
use courier_utils::{logging, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli();

    // Load configuration
    let config = Settings::new(cli.config.clone())?;

    match cli.command {
        Commands::Serve => {
            telemetry::init(
                &config.telemetry.for_collector(),
                &config.log.level,
                &config.log.format,
            )?;
            let result = commands::serve(&config).await;
            telemetry::shutdown();
            result?;
        }
        Commands::Drain => {
            logging::init_with_format(&config.log.level, &config.log.format)?;
            commands::drain(&config).await?;
        }
        Commands::Purge => {
            logging::init_with_format(&config.log.level, &config.log.format)?;
            commands::purge(&config)?;
        }
        Commands::Stats => {
            logging::init_with_format(&config.log.level, &config.log.format)?;
            commands::stats(&config)?;
        }
    }
    Ok(())
}
