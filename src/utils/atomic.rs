//! Atomic file operations
//!
//! The analytics log is only ever replaced, never edited in place.
//!
//! # Pattern
//!
//! 1. Write to a sibling temporary file (`<name>.tmp`)
//! 2. Call sync_all() to flush to disk
//! 3. Rename temp file to final path (atomic on POSIX filesystems)
//!
//! A crash leaves either the old file or the new file at the final path,
//! never a partial write.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CmsResult;

/// Path of the temporary sibling used while replacing `path`
///
/// The suffix is appended rather than substituted so that `analytics.json`
/// stages through `analytics.json.tmp`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace `path` with `content`
///
/// # Example
///
/// ```ignore
/// atomic_write("data/analytics.json", "{\"visits\": []}")?;
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> CmsResult<()> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Remove a temp file left behind by an interrupted replace of `path`
///
/// Returns `true` when a stale file was found and removed.
pub fn cleanup_temp_file<P: AsRef<Path>>(path: P) -> CmsResult<bool> {
    let temp_path = temp_path_for(path.as_ref());
    if !temp_path.is_file() {
        return Ok(false);
    }
    fs::remove_file(&temp_path)?;
    Ok(true)
}

/// Copy an unreadable file aside before it gets overwritten
///
/// The copy is named `<name>.corrupt-<unix seconds>` and its path returned.
pub fn preserve_copy<P: AsRef<Path>>(path: P, unix_secs: i64) -> CmsResult<PathBuf> {
    let path = path.as_ref();
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".corrupt-{}", unix_secs));
    let backup = path.with_file_name(name);
    fs::copy(path, &backup)?;
    Ok(backup)
}
