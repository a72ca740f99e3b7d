//! CLI route: single route table and run context.

use crate::cli::help::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_changes_text, format_diff_text, format_scan_text, DiffReport, DirectoryReport,
};
use crate::config::SyncConfig;
use crate::error::ApiError;
use crate::snapshot::DirectorySnapshot;
use crate::tree::path::canonicalize_path;
use crate::watch::{self, WatchConfig, WatchedDirectory};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Runtime context for CLI execution: the effective configuration.
pub struct RunContext {
    config: SyncConfig,
}

impl RunContext {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis(),
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Scan {
                path,
                recursive,
                format,
            } => {
                let reports = self.scan(path, *recursive)?;
                if format == "json" {
                    match reports.first() {
                        Some(report) if !*recursive => Ok(serde_json::to_string_pretty(report)?),
                        _ => Ok(serde_json::to_string_pretty(&reports)?),
                    }
                } else {
                    Ok(format_scan_text(&reports))
                }
            }
            Commands::Diff {
                left,
                right,
                format,
            } => {
                let left: DirectorySnapshot =
                    DirectorySnapshot::from_path_with(left, self.config.snapshot)?;
                let right: DirectorySnapshot =
                    DirectorySnapshot::from_path_with(right, self.config.snapshot)?;
                let report = DiffReport::new(&left, &right);
                if format == "json" {
                    Ok(serde_json::to_string_pretty(&report)?)
                } else {
                    Ok(format_diff_text(&report))
                }
            }
            Commands::Watch { path, debounce_ms } => {
                let watch_config = WatchConfig {
                    debounce_ms: debounce_ms.unwrap_or(self.config.watch.debounce_ms),
                };
                if watch_config.debounce_ms == 0 {
                    return Err(ApiError::ConfigError(
                        "debounce_ms must be greater than 0".to_string(),
                    ));
                }
                self.handle_watch(path, &watch_config)
            }
            Commands::Config => self.config.to_toml(),
        }
    }

    /// Snapshot `root`, and with `recursive` every directory below it, each on its own
    fn scan(&self, root: &Path, recursive: bool) -> Result<Vec<DirectoryReport>, ApiError> {
        let mut reports = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = VecDeque::from([root.to_path_buf()]);

        while let Some(dir) = pending.pop_front() {
            if !visited.insert(canonicalize_path(&dir)?) {
                warn!(path = %dir.display(), "Directory already scanned, skipping");
                continue;
            }

            let snapshot: DirectorySnapshot =
                DirectorySnapshot::from_path_with(&dir, self.config.snapshot)?;
            if recursive {
                pending.extend(snapshot.subdirectories().iter().cloned());
            }
            reports.push(DirectoryReport::from_snapshot(&snapshot));
        }

        Ok(reports)
    }

    fn handle_watch(&self, path: &Path, config: &WatchConfig) -> Result<String, ApiError> {
        let dir: WatchedDirectory = WatchedDirectory::new(path, self.config.snapshot)?;
        println!("{}  {}", dir.current().snapshot_digest(), path.display());

        watch::watch(&dir, config, |changes| {
            println!("{}", format_changes_text(changes));
            true
        })?;

        Ok(format!("Stopped watching {}", path.display()))
    }
}
