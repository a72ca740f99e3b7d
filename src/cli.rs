//! CLI domain: parse, route, help, output, and presentation only.
//! Snapshotting and watching live in their own modules; routes call into them.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_changes_text, format_diff_text, format_scan_text, DiffReport, DirectoryReport,
    EntryReport,
};
pub use route::RunContext;
