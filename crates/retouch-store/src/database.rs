// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use retouch_core::RetouchError;
use tracing::debug;

use crate::migrations;

/// Handle to the embedded SQLite database.
///
/// Cheap to clone; all clones share one background connection.
#[derive(Debug, Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, RetouchError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RetouchError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        conn.call(
            |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;",
                )?;
                migrations::run_migrations(conn)?;
                Ok(())
            },
        )
        .await
        .map_err(|e| RetouchError::Storage {
            source: match e {
                tokio_rusqlite::Error::Error(source) => source,
                other => other.to_string().into(),
            },
        })?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The shared background connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), RetouchError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error variant.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> RetouchError {
    RetouchError::Storage {
        source: Box::new(err),
    }
}
