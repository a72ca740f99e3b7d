//! CLI parse: clap types for treesync. No behavior; definitions only.

use crate::tree::SymlinkPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// treesync - Merkle-tree change detection for directories
#[derive(Parser, Debug)]
#[command(name = "treesync")]
#[command(about = "Detect directory changes by comparing Merkle trees of entry metadata")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Symlink policy (follow, copy, ignore)
    #[arg(long, global = true)]
    pub symlinks: Option<SymlinkPolicy>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Snapshot a directory and print its digests
    Scan {
        /// Directory to snapshot
        path: PathBuf,
        /// Also snapshot every subdirectory, each on its own
        #[arg(long)]
        recursive: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Compare two directories
    Diff {
        left: PathBuf,
        right: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
    /// Watch a directory and print changes as they happen
    Watch {
        path: PathBuf,
        /// Debounce window in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Print the effective configuration
    Config,
}
