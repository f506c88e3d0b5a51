// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dual-mode image and history persistence for the Retouch image playground.
//!
//! Image bytes live either as flat files under an output directory or as
//! blobs in an embedded WAL-mode SQLite database, behind one
//! [`HistoryCache`] facade. The batch history itself is a JSON log; writes
//! to the embedded database are serialized through tokio-rusqlite's single
//! background thread.

pub mod blobs;
pub mod cache;
pub mod database;
pub mod fs_store;
pub mod history;
pub mod migrations;
pub mod mode;
pub mod queries;

pub use blobs::BlobCache;
pub use cache::{HistoryCache, NewBatch, RecordOutcome};
pub use database::Database;
pub use fs_store::{is_safe_filename, FilesystemStore};
pub use history::HistoryLog;
pub use mode::resolve_storage_mode;
