//! Content store and revision resolution
//!
//! Documents live as markdown files in a flat directory:
//!
//! ```text
//! content/
//! ├── index.md          # "index", revision 1
//! ├── guide.md          # "guide", revision 1
//! ├── guide.v2.md       # "guide", revision 2
//! ├── guide.v3.md       # "guide", revision 3
//! └── guide/            # assets for "guide" (ignored by the resolver)
//!     └── diagram.png
//! ```
//!
//! The directory is re-scanned on every call; there is no index to go stale.

mod front_matter;
mod resolver;

pub use front_matter::{split_front_matter, SplitDocument};
pub use resolver::{is_valid_base_name, parse_file_name, ParsedName, RevisionResolver};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to the place documents are stored
///
/// Errors are reported as plain `io::Error`; the resolver treats every
/// failure the same way, as "no such document".
pub trait ContentSource: Send + Sync {
    /// Names of the regular files in the store
    fn list_entries(&self) -> io::Result<Vec<String>>;

    /// Full text of one stored file
    fn read(&self, key: &str) -> io::Result<String>;
}

/// A content store backed by one directory on disk
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for FsContentSource {
    fn list_entries(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            // is_file() follows symlinks, so linked documents still count
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, key: &str) -> io::Result<String> {
        if key.contains('/') || key.contains('\\') || key == ".." || key.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {}", key),
            ));
        }
        fs::read_to_string(self.root.join(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_entries_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("guide.md"), "# Guide").unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide").join("img.png"), [0u8; 4]).unwrap();

        let source = FsContentSource::new(dir.path());
        let entries = source.list_entries().unwrap();

        assert_eq!(entries, vec!["guide.md".to_string()]);
    }

    #[test]
    fn test_read_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let source = FsContentSource::new(dir.path());

        let err = source.read("../secret.md").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let source = FsContentSource::new("/definitely/not/here");
        assert!(source.list_entries().is_err());
    }
}
