//! Path canonicalization and normalization utilities

use crate::error::SnapshotError;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize and normalize a path
///
/// This function:
/// 1. Canonicalizes the path (resolves symlinks, `..`, `.`)
/// 2. Normalizes Unicode to NFC
/// 3. Removes trailing slashes (except root)
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, SnapshotError> {
    // dunce avoids UNC-prefixed results on Windows
    let canonical = dunce::canonicalize(path).map_err(|e| SnapshotError::filesystem(path, e))?;
    Ok(PathBuf::from(normalize_path_string(&canonical.to_string_lossy())))
}

/// Normalize a path string without filesystem access
///
/// Used when the path is already canonical and only needs a consistent
/// Unicode form and no trailing separator.
pub fn normalize_path_string(path: &str) -> String {
    // Normalize Unicode to NFC
    let mut result: String = path.nfc().collect();

    // Remove trailing slashes (except root)
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }
    result
}

/// Normalize an entry name for display
///
/// Lossy: invalid UTF-8 becomes U+FFFD and composed and decomposed forms
/// collapse to one string. Never use the result as an identity; see
/// [`name_bytes`].
pub fn normalize_name(name: &OsStr) -> String {
    name.to_string_lossy().nfc().collect()
}

/// The raw bytes of an entry name, exactly as the filesystem stores them
#[cfg(unix)]
pub fn name_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

/// The raw bytes of an entry name, exactly as the filesystem stores them
///
/// Names are UTF-16 here; only unpaired surrogates are replaced.
#[cfg(not(unix))]
pub fn name_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    match name.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

/// Render the parent of `path` relative to `root`, wrapped in slashes
///
/// Direct children of `root` yield `"/"`; `root/a/b/file` yields `"/a/b/"`.
/// A path outside `root` yields its full parent.
pub fn relative_parent(root: &Path, path: &Path) -> String {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let relative = parent.strip_prefix(root).unwrap_or(parent);

    let mut rendered = String::from("/");
    for component in relative.components() {
        // Root, prefix and `.`/`..` components carry no name
        if let Component::Normal(name) = component {
            rendered.push_str(&normalize_name(name));
            rendered.push('/');
        }
    }
    rendered
}
