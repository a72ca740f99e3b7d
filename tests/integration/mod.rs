//! Integration tests for treesync

mod blake3_verification;
mod config_integration;
mod snapshot_scenarios;
mod tree_structure;
mod watch_refresh;
