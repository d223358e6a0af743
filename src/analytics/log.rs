//! The durable analytics log
//!
//! One pretty-printed JSON document, `{"visits": [...]}`, replaced
//! atomically on every flush. Reads never fail: a missing, unreadable or
//! corrupt file reads as an empty log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::CmsResult;
use crate::types::AnalyticsLog;
use crate::utils::{atomic_write, cleanup_temp_file, preserve_copy};

/// Why a read came back empty
#[derive(Debug)]
enum ReadFailure {
    Missing,
    Unreadable(io::Error),
    Corrupt(serde_json::Error),
}

/// Handle on the log file location
#[derive(Debug, Clone)]
pub struct AnalyticsLogFile {
    path: PathBuf,
}

impl AnalyticsLogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepare the log for use
    ///
    /// Removes a temp file left by a crash mid-flush and creates an empty
    /// log when none exists yet.
    pub fn initialize(&self) -> CmsResult<()> {
        if cleanup_temp_file(&self.path)? {
            warn!(path = %self.path.display(), "removed stale temp file from interrupted flush");
        }
        if !self.path.exists() {
            self.write(&AnalyticsLog::default())?;
            info!(path = %self.path.display(), "created analytics log");
        }
        Ok(())
    }

    fn try_read(&self) -> Result<AnalyticsLog, ReadFailure> {
        // Raw bytes, so invalid UTF-8 is reported as corrupt content
        let data = fs::read(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReadFailure::Missing,
            _ => ReadFailure::Unreadable(e),
        })?;
        serde_json::from_slice(&data).map_err(ReadFailure::Corrupt)
    }

    /// Read the whole log, substituting an empty one on any failure
    pub fn read(&self) -> AnalyticsLog {
        match self.try_read() {
            Ok(log) => log,
            Err(ReadFailure::Missing) => AnalyticsLog::default(),
            Err(ReadFailure::Unreadable(e)) => {
                warn!(path = %self.path.display(), error = %e, "analytics log unreadable, using empty log");
                AnalyticsLog::default()
            }
            Err(ReadFailure::Corrupt(e)) => {
                warn!(path = %self.path.display(), error = %e, "analytics log corrupt, using empty log");
                AnalyticsLog::default()
            }
        }
    }

    /// Read the log as the base for an append
    ///
    /// Like `read`, but a corrupt file is copied aside first, since the
    /// next write replaces it.
    pub fn read_for_append(&self) -> AnalyticsLog {
        match self.try_read() {
            Ok(log) => log,
            Err(ReadFailure::Corrupt(e)) => {
                let stamp = chrono::Utc::now().timestamp();
                match preserve_copy(&self.path, stamp) {
                    Ok(backup) => warn!(
                        error = %e,
                        backup = %backup.display(),
                        "analytics log corrupt, preserved copy and starting fresh"
                    ),
                    Err(copy_err) => warn!(
                        error = %e,
                        copy_error = %copy_err,
                        "analytics log corrupt and could not be preserved, starting fresh"
                    ),
                }
                AnalyticsLog::default()
            }
            Err(_) => self.read(),
        }
    }

    /// Atomically replace the log
    pub fn write(&self, log: &AnalyticsLog) -> CmsResult<()> {
        let json = serde_json::to_string_pretty(log)?;
        atomic_write(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Visit;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_empty_log() {
        let dir = TempDir::new().unwrap();
        let file = AnalyticsLogFile::new(dir.path().join("analytics.json"));

        file.initialize().unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        assert_eq!(raw, "{\n  \"visits\": []\n}");
    }

    #[test]
    fn test_initialize_keeps_existing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analytics.json");
        let existing = r#"{"visits":[{"page":"/","timestamp":"2025-01-01T00:00:00Z"}]}"#;
        fs::write(&path, existing).unwrap();

        AnalyticsLogFile::new(&path).initialize().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), existing);
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let file = AnalyticsLogFile::new(dir.path().join("analytics.json"));
        let ts = Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap();
        let log = AnalyticsLog {
            visits: vec![Visit::new("/a", "h").with_version("v2").stamp(ts)],
        };

        file.write(&log).unwrap();

        assert_eq!(file.read(), log);
    }

    #[test]
    fn test_missing_and_corrupt_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let file = AnalyticsLogFile::new(dir.path().join("analytics.json"));
        assert!(file.read().visits.is_empty());

        fs::write(file.path(), "{\"visits\": [ truncated").unwrap();
        assert!(file.read().visits.is_empty());
    }

    #[test]
    fn test_read_for_append_preserves_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let file = AnalyticsLogFile::new(dir.path().join("analytics.json"));
        fs::write(file.path(), "garbage").unwrap();

        assert!(file.read_for_append().visits.is_empty());

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "garbage");
    }

    #[test]
    fn test_read_for_append_preserves_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let file = AnalyticsLogFile::new(dir.path().join("analytics.json"));
        let ts = Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap();
        file.write(&AnalyticsLog {
            visits: vec![Visit::new("/old", "h").stamp(ts)],
        })
        .unwrap();
        let mut bytes = fs::read(file.path()).unwrap();
        bytes[20] = 0xff;
        fs::write(file.path(), &bytes).unwrap();

        assert!(file.read_for_append().visits.is_empty());

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read(backups[0].path()).unwrap(), bytes);
    }
}
