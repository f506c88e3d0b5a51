// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable history log.
//!
//! The ordered batch list (newest first) is persisted as one JSON array. A
//! missing or corrupt file yields an empty history rather than a startup
//! failure; history is convenience data, not a ledger.

use std::path::{Path, PathBuf};

use retouch_core::{GenerationBatch, RetouchError};
use tracing::warn;

/// JSON-file-backed history log.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the batch list. Missing file or unparseable JSON yields an empty
    /// list with a warning.
    pub async fn load(&self) -> Vec<GenerationBatch> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history unreadable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(batches) => batches,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the batch list, replacing the previous contents atomically.
    pub async fn save(&self, batches: &[GenerationBatch]) -> Result<(), RetouchError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RetouchError::Storage {
                    source: Box::new(e),
                })?;
        }

        let json = serde_json::to_string(batches).map_err(|e| RetouchError::Storage {
            source: Box::new(e),
        })?;

        // Write-then-rename so a crash mid-write never truncates the log.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RetouchError::Storage {
                source: Box::new(e),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RetouchError::Storage {
                source: Box::new(e),
            })?;
        Ok(())
    }
}
