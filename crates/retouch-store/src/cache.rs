// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dual-mode history cache.
//!
//! One facade over the two interchangeable image-byte backends. The storage
//! mode is resolved once at construction; every batch records the mode it was
//! written under, and reads dispatch on that recorded mode, so history spanning
//! a mode change keeps resolving.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{info, warn};

use retouch_config::model::StorageConfig;
use retouch_core::{
    BatchImage, BatchMode, CostBreakdown, GenerationBatch, ImageRef, OutputFormat, Quality,
    RetouchError, StorageMode,
};

use crate::blobs::BlobCache;
use crate::database::Database;
use crate::fs_store::FilesystemStore;
use crate::history::HistoryLog;
use crate::mode::resolve_storage_mode;
use crate::queries;

/// Inputs for recording one successful generation call.
#[derive(Debug)]
pub struct NewBatch {
    pub prompt: String,
    pub quality: Quality,
    pub output_format: OutputFormat,
    pub duration_ms: u64,
    pub cost_details: Option<CostBreakdown>,
    /// Decoded image payloads, in provider order.
    pub payloads: Vec<Vec<u8>>,
}

/// Result of recording a batch. `failed` counts payloads that could not be
/// stored; the batch covers only the images that succeeded.
#[derive(Debug)]
pub struct RecordOutcome {
    pub batch: GenerationBatch,
    pub stored: usize,
    pub failed: usize,
}

/// Facade over batch history and image bytes in both storage modes.
pub struct HistoryCache {
    mode: StorageMode,
    fs: FilesystemStore,
    db: Option<Database>,
    log: HistoryLog,
    /// Ordered newest first. `timestamp` is the unique key.
    entries: RwLock<Vec<GenerationBatch>>,
    blobs: BlobCache,
}

impl HistoryCache {
    /// Resolve the storage mode, open the backing stores, and load history.
    pub async fn open(config: &StorageConfig) -> Result<Self, RetouchError> {
        let mode = resolve_storage_mode(config)?;
        let db = match mode {
            StorageMode::Embedded => Some(Database::open(&config.database_path).await?),
            StorageMode::Filesystem => None,
        };
        let log = HistoryLog::new(&config.history_path);
        let entries = log.load().await;
        info!(mode = %mode, batches = entries.len(), "history cache opened");

        Ok(Self {
            mode,
            fs: FilesystemStore::new(&config.output_dir),
            db,
            log,
            entries: RwLock::new(entries),
            blobs: BlobCache::new(),
        })
    }

    /// The mode new batches are written under.
    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// The ordered batch list, newest first.
    pub async fn history(&self) -> Vec<GenerationBatch> {
        self.entries.read().await.clone()
    }

    /// Record a successful generation call as a new batch.
    ///
    /// Payloads are stored concurrently; a payload that fails to store is
    /// dropped from the batch with a warning rather than failing the whole
    /// call. Storing nothing at all is an error.
    pub async fn record_batch(&self, new: NewBatch) -> Result<RecordOutcome, RetouchError> {
        if new.payloads.is_empty() {
            return Err(RetouchError::Internal(
                "cannot record a batch with no images".to_string(),
            ));
        }

        let mut entries = self.entries.write().await;

        // Millisecond timestamps are the unique batch key; bump on collision.
        let mut timestamp = chrono::Utc::now().timestamp_millis();
        while entries.iter().any(|b| b.timestamp == timestamp) {
            timestamp += 1;
        }

        let ext = new.output_format.extension();
        let stores = new.payloads.iter().enumerate().map(|(i, bytes)| {
            let filename = format!("{timestamp}-{i}.{ext}");
            async move {
                let result = match self.mode {
                    StorageMode::Filesystem => self.fs.write(&filename, bytes).await,
                    StorageMode::Embedded => {
                        // db is Some in embedded mode.
                        match &self.db {
                            Some(db) => {
                                queries::images::put_image(db, &filename, bytes.clone(), timestamp)
                                    .await
                            }
                            None => Err(RetouchError::Internal(
                                "embedded mode without database".to_string(),
                            )),
                        }
                    }
                };
                (filename, bytes, result)
            }
        });

        let mut images = Vec::new();
        let mut failed = 0;
        for (filename, bytes, result) in join_all(stores).await {
            match result {
                Ok(()) => {
                    if self.mode == StorageMode::Embedded {
                        self.blobs.insert(&filename, bytes.clone());
                    }
                    images.push(BatchImage { filename });
                }
                Err(e) => {
                    warn!(filename, error = %e, "failed to store image, dropping from batch");
                    failed += 1;
                }
            }
        }

        if images.is_empty() {
            return Err(RetouchError::Storage {
                source: "no image in the batch could be stored".into(),
            });
        }

        let stored = images.len();
        let batch = GenerationBatch {
            timestamp,
            images,
            storage_mode_used: self.mode,
            duration_ms: new.duration_ms,
            quality: new.quality,
            prompt: new.prompt,
            mode: BatchMode::Edit,
            cost_details: new.cost_details,
            output_format: new.output_format,
        };

        entries.insert(0, batch.clone());
        self.log.save(&entries).await?;

        Ok(RecordOutcome {
            batch,
            stored,
            failed,
        })
    }

    /// Resolve a filename to a backend-tagged reference, using the owning
    /// batch's **recorded** storage mode rather than the current one.
    pub async fn locate(&self, filename: &str) -> Result<ImageRef, RetouchError> {
        let entries = self.entries.read().await;
        let batch = entries
            .iter()
            .find(|b| b.images.iter().any(|i| i.filename == filename))
            .ok_or_else(|| {
                RetouchError::NotFound(format!("no batch owns image `{filename}`"))
            })?;

        Ok(match batch.storage_mode_used {
            StorageMode::Filesystem => ImageRef::Filesystem {
                path: self.fs.root().join(filename).to_string_lossy().into_owned(),
            },
            StorageMode::Embedded => ImageRef::Embedded {
                filename: filename.to_string(),
            },
        })
    }

    /// Read image bytes by filename, dispatching on the resolved [`ImageRef`].
    ///
    /// A filename no batch owns, or whose bytes are gone, is `NotFound`; the
    /// caller treats the entry as partially unavailable.
    pub async fn read_image(&self, filename: &str) -> Result<Arc<Vec<u8>>, RetouchError> {
        match self.locate(filename).await? {
            ImageRef::Filesystem { .. } => match self.fs.read(filename).await? {
                Some(bytes) => Ok(Arc::new(bytes)),
                None => Err(RetouchError::NotFound(format!(
                    "image `{filename}` unavailable"
                ))),
            },
            ImageRef::Embedded { filename } => {
                if let Some(cached) = self.blobs.get(&filename) {
                    return Ok(cached);
                }
                let Some(db) = &self.db else {
                    return Err(RetouchError::NotFound(format!(
                        "image `{filename}` unavailable: embedded database not open"
                    )));
                };
                match queries::images::get_image(db, &filename).await? {
                    Some(bytes) => Ok(self.blobs.insert(&filename, bytes)),
                    None => Err(RetouchError::NotFound(format!(
                        "image `{filename}` unavailable"
                    ))),
                }
            }
        }
    }

    /// Delete a batch by timestamp: its bytes, its blob references, and its
    /// history entry.
    pub async fn delete_batch(&self, timestamp: i64) -> Result<GenerationBatch, RetouchError> {
        let mut entries = self.entries.write().await;
        let index = entries
            .iter()
            .position(|b| b.timestamp == timestamp)
            .ok_or_else(|| RetouchError::NotFound(format!("no batch at timestamp {timestamp}")))?;
        let batch = entries.remove(index);

        let filenames: Vec<String> = batch.images.iter().map(|i| i.filename.clone()).collect();
        self.delete_bytes(batch.storage_mode_used, &filenames).await?;
        for filename in &filenames {
            self.blobs.release(filename);
        }

        self.log.save(&entries).await?;
        Ok(batch)
    }

    /// Delete individual images by filename, trimming them out of their
    /// owning batches. Batches left without images are dropped entirely.
    /// Returns how many files had bytes removed.
    pub async fn delete_files(&self, filenames: &[String]) -> Result<usize, RetouchError> {
        let mut entries = self.entries.write().await;

        let mut by_mode: Vec<(StorageMode, Vec<String>)> = Vec::new();
        for filename in filenames {
            let mode = entries
                .iter()
                .find(|b| b.images.iter().any(|i| i.filename == *filename))
                .map(|b| b.storage_mode_used)
                .unwrap_or(self.mode);
            match by_mode.iter_mut().find(|(m, _)| *m == mode) {
                Some((_, names)) => names.push(filename.clone()),
                None => by_mode.push((mode, vec![filename.clone()])),
            }
        }

        let mut removed = 0;
        for (mode, names) in &by_mode {
            removed += self.delete_bytes(*mode, names).await?;
        }

        for filename in filenames {
            self.blobs.release(filename);
        }
        for batch in entries.iter_mut() {
            batch.images.retain(|i| !filenames.contains(&i.filename));
        }
        entries.retain(|b| !b.images.is_empty());

        self.log.save(&entries).await?;
        Ok(removed)
    }

    /// Clear all history: the ordered list, every stored byte, and every
    /// cached blob reference.
    pub async fn clear(&self) -> Result<(), RetouchError> {
        let mut entries = self.entries.write().await;

        // Filesystem bytes are deleted per recorded filename; the embedded
        // database is emptied wholesale.
        let fs_files: Vec<String> = entries
            .iter()
            .filter(|b| b.storage_mode_used == StorageMode::Filesystem)
            .flat_map(|b| b.images.iter().map(|i| i.filename.clone()))
            .collect();
        if !fs_files.is_empty() {
            self.fs.delete_many(&fs_files).await?;
        }
        if let Some(db) = &self.db {
            queries::images::clear_images(db).await?;
        }

        self.blobs.clear();
        entries.clear();
        self.log.save(&entries).await?;
        info!("history cleared");
        Ok(())
    }

    /// Checkpoint and release the embedded database, if open.
    pub async fn close(&self) -> Result<(), RetouchError> {
        if let Some(db) = &self.db {
            db.close().await?;
        }
        Ok(())
    }

    async fn delete_bytes(
        &self,
        mode: StorageMode,
        filenames: &[String],
    ) -> Result<usize, RetouchError> {
        match mode {
            StorageMode::Filesystem => self.fs.delete_many(filenames).await,
            StorageMode::Embedded => match &self.db {
                Some(db) => queries::images::delete_images(db, filenames).await,
                // Entries recorded under embedded mode but read after a switch
                // to filesystem mode have no database to delete from.
                None => {
                    warn!(count = filenames.len(), "embedded-mode bytes unreachable, dropping entries only");
                    Ok(0)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path, mode: &str) -> StorageConfig {
        StorageConfig {
            mode: Some(mode.to_string()),
            output_dir: dir.join("images").to_string_lossy().into_owned(),
            database_path: dir.join("retouch.db").to_string_lossy().into_owned(),
            history_path: dir.join("history.json").to_string_lossy().into_owned(),
            managed_platform: false,
        }
    }

    fn new_batch(payloads: Vec<Vec<u8>>) -> NewBatch {
        NewBatch {
            prompt: "add a hat".into(),
            quality: Quality::Auto,
            output_format: OutputFormat::Png,
            duration_ms: 1200,
            cost_details: None,
            payloads,
        }
    }

    #[tokio::test]
    async fn record_and_read_in_filesystem_mode() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();

        let outcome = cache
            .record_batch(new_batch(vec![vec![1, 2], vec![3, 4]]))
            .await
            .unwrap();
        assert_eq!(outcome.stored, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.batch.images.len(), 2);
        assert_eq!(outcome.batch.storage_mode_used, StorageMode::Filesystem);

        let ts = outcome.batch.timestamp;
        assert_eq!(outcome.batch.images[0].filename, format!("{ts}-0.png"));
        assert_eq!(outcome.batch.images[1].filename, format!("{ts}-1.png"));

        let bytes = cache.read_image(&outcome.batch.images[1].filename).await.unwrap();
        assert_eq!(*bytes, vec![3, 4]);
    }

    #[tokio::test]
    async fn record_and_read_in_embedded_mode() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "embedded-db")).await.unwrap();

        let outcome = cache.record_batch(new_batch(vec![vec![9, 9]])).await.unwrap();
        assert_eq!(outcome.batch.storage_mode_used, StorageMode::Embedded);

        let filename = &outcome.batch.images[0].filename;
        let first = cache.read_image(filename).await.unwrap();
        let second = cache.read_image(filename).await.unwrap();
        assert_eq!(*first, vec![9, 9]);
        // Cached reads reuse the same reference.
        assert!(Arc::ptr_eq(&first, &second));

        cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn locate_tags_references_by_recorded_mode() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();

        let outcome = cache.record_batch(new_batch(vec![vec![1]])).await.unwrap();
        let filename = &outcome.batch.images[0].filename;

        match cache.locate(filename).await.unwrap() {
            ImageRef::Filesystem { path } => assert!(path.ends_with(filename.as_str())),
            other => panic!("expected a filesystem ref, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_filename_is_not_found() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();
        let err = cache.read_image("1-0.png").await.unwrap_err();
        assert!(matches!(err, RetouchError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_bytes_surface_as_partially_unavailable() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();

        let outcome = cache.record_batch(new_batch(vec![vec![1]])).await.unwrap();
        let filename = outcome.batch.images[0].filename.clone();

        // Remove the file behind the cache's back.
        std::fs::remove_file(dir.path().join("images").join(&filename)).unwrap();

        let err = cache.read_image(&filename).await.unwrap_err();
        assert!(matches!(err, RetouchError::NotFound(_)));
    }

    #[tokio::test]
    async fn history_is_ordered_newest_first() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();

        let first = cache.record_batch(new_batch(vec![vec![1]])).await.unwrap();
        let second = cache.record_batch(new_batch(vec![vec![2]])).await.unwrap();
        assert_ne!(first.batch.timestamp, second.batch.timestamp);

        let history = cache.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, second.batch.timestamp);
        assert_eq!(history[1].timestamp, first.batch.timestamp);
    }

    #[tokio::test]
    async fn delete_batch_removes_bytes_and_entry() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "embedded-db")).await.unwrap();

        let outcome = cache.record_batch(new_batch(vec![vec![1], vec![2]])).await.unwrap();
        let ts = outcome.batch.timestamp;
        let filenames: Vec<String> = outcome
            .batch
            .images
            .iter()
            .map(|i| i.filename.clone())
            .collect();

        cache.delete_batch(ts).await.unwrap();

        assert!(cache.history().await.is_empty());
        for filename in &filenames {
            let err = cache.read_image(filename).await.unwrap_err();
            assert!(matches!(err, RetouchError::NotFound(_)), "{filename}");
        }

        cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_batch_is_not_found() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();
        let err = cache.delete_batch(42).await.unwrap_err();
        assert!(matches!(err, RetouchError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_files_trims_batches_and_drops_empty_ones() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();

        let outcome = cache.record_batch(new_batch(vec![vec![1], vec![2]])).await.unwrap();
        let keep = outcome.batch.images[0].filename.clone();
        let trimmed = outcome.batch.images[1].filename.clone();

        let removed = cache.delete_files(std::slice::from_ref(&trimmed)).await.unwrap();
        assert_eq!(removed, 1);

        let history = cache.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].images.len(), 1);
        assert_eq!(history[0].images[0].filename, keep);

        let removed = cache.delete_files(std::slice::from_ref(&keep)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.history().await.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_list_and_blob_store() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "embedded-db")).await.unwrap();

        let a = cache.record_batch(new_batch(vec![vec![1]])).await.unwrap();
        let b = cache.record_batch(new_batch(vec![vec![2]])).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.history().await.is_empty());
        for filename in [
            &a.batch.images[0].filename,
            &b.batch.images[0].filename,
        ] {
            let err = cache.read_image(filename).await.unwrap_err();
            assert!(matches!(err, RetouchError::NotFound(_)), "{filename}");
        }

        cache.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let dir = tempdir().unwrap();
        let cfg = config(dir.path(), "filesystem");

        let ts = {
            let cache = HistoryCache::open(&cfg).await.unwrap();
            cache
                .record_batch(new_batch(vec![vec![7]]))
                .await
                .unwrap()
                .batch
                .timestamp
        };

        let cache = HistoryCache::open(&cfg).await.unwrap();
        let history = cache.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, ts);

        // Bytes are still readable after reopen.
        let bytes = cache.read_image(&history[0].images[0].filename).await.unwrap();
        assert_eq!(*bytes, vec![7]);
    }

    #[tokio::test]
    async fn recording_nothing_is_an_error() {
        let dir = tempdir().unwrap();
        let cache = HistoryCache::open(&config(dir.path(), "filesystem")).await.unwrap();
        assert!(cache.record_batch(new_batch(vec![])).await.is_err());
    }
}
