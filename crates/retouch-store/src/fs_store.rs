// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem image store for filesystem mode.
//!
//! Images live as flat files under one output directory; the filename is the
//! only key. Filenames arriving from clients must pass [`is_safe_filename`]
//! before touching the filesystem.

use std::path::{Path, PathBuf};

use retouch_core::RetouchError;
use tracing::{debug, warn};

/// Reject filenames that could escape the output directory.
///
/// A safe filename does not contain `..` and does not start with `/` or `\`.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.starts_with('/')
        && !filename.starts_with('\\')
}

/// Flat-file image store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Write image bytes under `filename`.
    pub async fn write(&self, filename: &str, bytes: &[u8]) -> Result<(), RetouchError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RetouchError::Storage {
                source: Box::new(e),
            })?;
        tokio::fs::write(self.path_for(filename), bytes)
            .await
            .map_err(|e| RetouchError::Storage {
                source: Box::new(e),
            })?;
        debug!(filename, len = bytes.len(), "image written to disk");
        Ok(())
    }

    /// Read image bytes by filename. `None` if the file does not exist.
    pub async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, RetouchError> {
        match tokio::fs::read(self.path_for(filename)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RetouchError::Storage {
                source: Box::new(e),
            }),
        }
    }

    /// Delete the given filenames, skipping missing files. Returns how many
    /// were actually removed.
    pub async fn delete_many(&self, filenames: &[String]) -> Result<usize, RetouchError> {
        let mut removed = 0;
        for filename in filenames {
            match tokio::fs::remove_file(self.path_for(filename)).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(filename, "delete skipped missing file");
                }
                Err(e) => {
                    return Err(RetouchError::Storage {
                        source: Box::new(e),
                    })
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn traversal_filenames_are_rejected() {
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("a/../../b.png"));
        assert!(!is_safe_filename("/etc/passwd"));
        assert!(!is_safe_filename("\\windows\\system32"));
        assert!(!is_safe_filename(""));
    }

    #[test]
    fn ordinary_filenames_are_accepted() {
        assert!(is_safe_filename("1700000000000-0.png"));
        assert!(is_safe_filename("photo.jpeg"));
    }

    #[tokio::test]
    async fn write_read_roundtrips() {
        let dir = tempdir().unwrap();
        let store = FilesystemStore::new(dir.path().join("images"));

        store.write("a.png", &[1, 2, 3]).await.unwrap();
        assert_eq!(store.read("a.png").await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn read_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = FilesystemStore::new(dir.path());
        assert_eq!(store.read("nope.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_many_skips_missing_files() {
        let dir = tempdir().unwrap();
        let store = FilesystemStore::new(dir.path());

        store.write("a.png", &[1]).await.unwrap();
        store.write("b.png", &[2]).await.unwrap();

        let removed = store
            .delete_many(&["a.png".into(), "ghost.png".into(), "b.png".into()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.read("a.png").await.unwrap(), None);
    }
}
