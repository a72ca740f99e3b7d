//! CLI presentation: text and json shapes for scan, diff and watch output.

use crate::snapshot::DirectorySnapshot;
use crate::tree::hasher::DigestAlgorithm;
use crate::tree::EntryKind;
use crate::types::Digest;
use crate::watch::ChangeSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use std::time::SystemTime;

/// One snapshotted directory
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub path: PathBuf,
    pub name: String,
    pub digest: Digest,
    pub top: Digest,
    /// Node count per tree level, leaves first
    pub levels: Vec<usize>,
    pub entry_count: usize,
    pub entries: Vec<EntryReport>,
    pub subdirectories: Vec<PathBuf>,
}

/// One entry of a snapshotted directory
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub name: String,
    #[serde(flatten)]
    pub kind: EntryKind,
    /// RFC 3339, UTC, nanosecond precision
    pub modified: String,
    pub digest: Digest,
}

impl DirectoryReport {
    pub fn from_snapshot<A: DigestAlgorithm>(snapshot: &DirectorySnapshot<A>) -> Self {
        Self {
            path: snapshot.absolute_path().to_path_buf(),
            name: snapshot.path(),
            digest: snapshot.snapshot_digest(),
            top: snapshot.top_hash_tree().top(),
            levels: snapshot.top_hash_tree().levels(),
            entry_count: snapshot.entry_count(),
            entries: snapshot
                .entries()
                .map(|entry| EntryReport {
                    name: entry.name.clone(),
                    kind: entry.kind.clone(),
                    modified: format_modified(entry.modified),
                    digest: entry.digest,
                })
                .collect(),
            subdirectories: snapshot.subdirectories().to_vec(),
        }
    }
}

/// Comparison of two directories
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_digest: Digest,
    pub right_digest: Digest,
    /// Snapshot digests match (entries and directory name)
    pub identical: bool,
    /// Tree tops match, ignoring the directory names
    pub entries_identical: bool,
    /// Leaf positions line up, so changes came from tree descent
    pub aligned: bool,
    pub changes: ChangeSet,
}

impl DiffReport {
    pub fn new<A: DigestAlgorithm>(left: &DirectorySnapshot<A>, right: &DirectorySnapshot<A>) -> Self {
        Self {
            left: left.absolute_path().to_path_buf(),
            right: right.absolute_path().to_path_buf(),
            left_digest: left.snapshot_digest(),
            right_digest: right.snapshot_digest(),
            identical: !left.differs_from(right),
            entries_identical: !left.top_hash_tree().differs_from(right.top_hash_tree()),
            aligned: left.top_hash_tree().levels() == right.top_hash_tree().levels(),
            changes: ChangeSet::between(left, right),
        }
    }
}

fn format_modified(modified: SystemTime) -> String {
    DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn kind_label(kind: &EntryKind) -> String {
    match kind {
        EntryKind::File => "file".to_string(),
        EntryKind::SymlinkCopy => "symlink".to_string(),
        EntryKind::FollowedSymlink { target } => format!("-> {}", target.display()),
    }
}

pub fn format_scan_text(reports: &[DirectoryReport]) -> String {
    let mut output = String::new();
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let _ = writeln!(
            output,
            "{}  {}  ({} entries, levels {:?})",
            report.path.display(),
            report.digest,
            report.entry_count,
            report.levels
        );
        for entry in &report.entries {
            let _ = writeln!(
                output,
                "  {}  {}  {}  {}",
                entry.digest,
                entry.modified,
                entry.name,
                kind_label(&entry.kind)
            );
        }
        for dir in &report.subdirectories {
            let _ = writeln!(output, "  {}/", dir.display());
        }
    }
    output.trim_end().to_string()
}

pub fn format_changes_text(changes: &ChangeSet) -> String {
    let mut output = String::new();
    for path in &changes.modified {
        let _ = writeln!(output, "M {}", path.display());
    }
    for path in &changes.added {
        let _ = writeln!(output, "A {}", path.display());
    }
    for path in &changes.removed {
        let _ = writeln!(output, "D {}", path.display());
    }
    output.trim_end().to_string()
}

pub fn format_diff_text(report: &DiffReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "left   {}  {}", report.left_digest, report.left.display());
    let _ = writeln!(output, "right  {}  {}", report.right_digest, report.right.display());

    if report.identical {
        output.push_str("identical");
        return output;
    }
    if report.entries_identical {
        output.push_str("entries identical, directory names differ");
        return output;
    }

    output.push_str("differs");
    let changes = format_changes_text(&report.changes);
    if !changes.is_empty() {
        output.push('\n');
        output.push_str(&changes);
    }
    output
}
