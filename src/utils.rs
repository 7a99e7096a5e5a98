//! Internal helpers: version directory naming, path normalization, and
//! atomic JSON writes.

use crate::error::{OcflateError, Result};
use crate::types::VersionId;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path};

/// OCFL version directory name for a version number, e.g. `v0001`
pub(crate) fn version_dirname(version: VersionId) -> String {
    format!("v{:04}", version)
}

/// Express `path` relative to `root` using forward slashes
///
/// Rejects non-UTF-8 components and paths that escape the root, since
/// manifest keys must be portable relative paths.
pub(crate) fn relative_unix_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| OcflateError::PathConversion(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| OcflateError::PathConversion(path.to_path_buf()))?;
                parts.push(part);
            }
            _ => return Err(OcflateError::PathConversion(path.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}

/// Serialize `value` as pretty JSON and write it atomically
///
/// Writes to a temporary sibling first, then renames into place, so a
/// crash mid-write never leaves a truncated document behind.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
