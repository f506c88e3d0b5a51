// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory blob reference cache.
//!
//! Holds at most one shared reference per filename; repeated reads of the
//! same image reuse the cached bytes instead of hitting the database again.
//! Releasing a filename drops the cache's reference exactly once; readers
//! still holding an `Arc` keep their bytes until they drop it.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

/// Filename-keyed cache of shared image bytes.
#[derive(Debug, Default)]
pub struct BlobCache {
    entries: DashMap<String, Arc<Vec<u8>>>,
}

impl BlobCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached blob.
    pub fn get(&self, filename: &str) -> Option<Arc<Vec<u8>>> {
        self.entries.get(filename).map(|e| Arc::clone(&e))
    }

    /// Insert bytes for a filename, returning the shared reference.
    ///
    /// An existing entry for the same filename is superseded and its
    /// reference released.
    pub fn insert(&self, filename: &str, bytes: Vec<u8>) -> Arc<Vec<u8>> {
        let arc = Arc::new(bytes);
        self.entries.insert(filename.to_string(), Arc::clone(&arc));
        trace!(filename, "blob cached");
        arc
    }

    /// Release the cache's reference for a filename, if present.
    pub fn release(&self, filename: &str) {
        if self.entries.remove(filename).is_some() {
            trace!(filename, "blob released");
        }
    }

    /// Release every cached reference.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached blobs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
