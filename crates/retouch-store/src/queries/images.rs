// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image blob CRUD operations for embedded-db mode.

use retouch_core::RetouchError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

/// Insert or replace an image blob.
pub async fn put_image(
    db: &Database,
    filename: &str,
    bytes: Vec<u8>,
    created_at: i64,
) -> Result<(), RetouchError> {
    let filename = filename.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO images (filename, blob, created_at)
                 VALUES (?1, ?2, ?3)",
                params![filename, bytes, created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch an image blob by filename.
pub async fn get_image(db: &Database, filename: &str) -> Result<Option<Vec<u8>>, RetouchError> {
    let filename = filename.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT blob FROM images WHERE filename = ?1",
                params![filename],
                |row| row.get::<_, Vec<u8>>(0),
            );
            match result {
                Ok(bytes) => Ok(Some(bytes)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the given filenames. Returns the number of rows removed.
pub async fn delete_images(db: &Database, filenames: &[String]) -> Result<usize, RetouchError> {
    let filenames = filenames.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut removed = 0;
            for filename in &filenames {
                removed += tx.execute(
                    "DELETE FROM images WHERE filename = ?1",
                    params![filename],
                )?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every stored image.
pub async fn clear_images(db: &Database) -> Result<(), RetouchError> {
    db.connection()
        .call(|conn| {
            conn.execute("DELETE FROM images", [])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Number of stored images.
pub async fn count_images(db: &Database) -> Result<i64, RetouchError> {
    db.connection()
        .call(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}
