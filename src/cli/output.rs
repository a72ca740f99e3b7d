//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, SnapshotError};

/// Map domain errors to a single line for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Snapshot(SnapshotError::Filesystem { path, source }) => {
            format!("error: cannot read {}: {}", path.display(), source)
        }
        other => format!("error: {}", other),
    }
}
