//! Error types for the treesync change-detection core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when turning external bytes or text into a `Digest`
#[derive(Debug, Error, PartialEq)]
pub enum DigestParseError {
    #[error("Invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid digest hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Merkle tree errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The two trees were not built from leaf sequences of the same shape,
    /// so positions cannot be paired during descent.
    #[error("Structural mismatch: left tree levels {left:?}, right tree levels {right:?}")]
    StructuralMismatch { left: Vec<usize>, right: Vec<usize> },
}

/// Directory snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported entry kind: {path:?}")]
    UnsupportedEntryKind { path: PathBuf },

    #[error("Symlink chain at {path:?} exceeds the maximum resolution depth of {max_depth}")]
    SymlinkDepthExceeded { path: PathBuf, max_depth: usize },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

impl SnapshotError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by the configuration, logging, watch and CLI layers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Output(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<notify::Error> for ApiError {
    fn from(err: notify::Error) -> Self {
        ApiError::Watch(err.to_string())
    }
}
