//! Command-name contract used in log events.

use crate::cli::parse::Commands;

/// Command name string for log events (e.g. "scan", "diff").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Scan { .. } => "scan",
        Commands::Diff { .. } => "diff",
        Commands::Watch { .. } => "watch",
        Commands::Config => "config",
    }
}
