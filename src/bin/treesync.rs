//! treesync CLI Binary
//!
//! Command-line interface for Merkle-tree directory change detection.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing::{error, info};
use treesync::cli::{Cli, RunContext};
use treesync::config::{ConfigLoader, SyncConfig};
use treesync::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    };

    // Initialize logging early
    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("treesync starting");

    let context = RunContext::new(config);
    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", treesync::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Load the layered configuration, then apply CLI flags on top.
/// Precedence: CLI flags override environment override config files override defaults.
fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli_overrides(cli, &mut config);

    if let Err(errors) = config.validate() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid command-line options:\n{}", messages.join("\n"));
    }
    Ok(config)
}

fn apply_cli_overrides(cli: &Cli, config: &mut SyncConfig) {
    if let Some(policy) = cli.symlinks {
        config.snapshot.symlinks = policy;
    }

    let logging = &mut config.logging;
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = file.clone();
    }
}
