// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage mode resolution.
//!
//! The mode is resolved once at process start and injected into every
//! component that needs it; nothing re-reads the environment afterwards.

use std::str::FromStr;

use retouch_core::{RetouchError, StorageMode};
use retouch_config::model::StorageConfig;
use tracing::info;

/// Resolve the storage mode from configuration.
///
/// Precedence: explicit override > managed-platform detection (ephemeral
/// filesystems get the embedded database) > filesystem default.
pub fn resolve_storage_mode(config: &StorageConfig) -> Result<StorageMode, RetouchError> {
    let mode = match &config.mode {
        Some(explicit) => StorageMode::from_str(explicit).map_err(|_| {
            RetouchError::Config(format!("unrecognized storage mode `{explicit}`"))
        })?,
        None if config.managed_platform => StorageMode::Embedded,
        None => StorageMode::Filesystem,
    };
    info!(mode = %mode, "storage mode resolved");
    Ok(mode)
}
