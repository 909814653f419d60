//! On-disk size estimates for sources and targets.
//!
//! Planners use these to size splits and pick partition counts. A missing path
//! is not an error: it reports `None` so callers can tell "absent" from "empty".

use anyhow::{Context, Result};
use glob::glob;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Size in bytes of a file, or of the direct entries of a directory.
///
/// - `None` if `path` does not exist.
/// - The file length if `path` is a file.
/// - The summed length of the directory's direct entries otherwise.
///   Sub-directories contribute 0 and are not descended into.
/// - 0 if the directory disappears while it is being listed.
///
/// # Errors
/// Any other I/O failure while inspecting `path` or its entries.
pub fn path_size(path: impl AsRef<Path>) -> Result<Option<u64>> {
    let path = path.as_ref();
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
    };
    if meta.is_file() {
        return Ok(Some(meta.len()));
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "directory vanished while listing; counting 0 bytes");
            return Ok(Some(0));
        }
        Err(e) => return Err(e).with_context(|| format!("list {}", path.display())),
    };

    let mut total = 0u64;
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", path.display()))?;
        match entry.metadata() {
            Ok(meta) if meta.is_file() => total += meta.len(),
            Ok(_) => {}
            // removed between listing and stat
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("stat {}", entry.path().display()));
            }
        }
    }
    Ok(Some(total))
}

/// Sum of [`path_size`] over every path matching `pattern`. Zero matches is 0.
///
/// # Errors
/// Returns an error for an invalid pattern or an unreadable match.
pub fn glob_size(pattern: &str) -> Result<u64> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
    let mut total = 0u64;
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        total += path_size(&path)?.unwrap_or(0);
    }
    Ok(total)
}
