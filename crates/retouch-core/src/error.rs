// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Retouch image playground.

use thiserror::Error;

/// The primary error type used across all Retouch crates.
#[derive(Debug, Error)]
pub enum RetouchError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Request validation errors (missing prompt, no source image, mask dimension
    /// mismatch). Never retried; surfaced inline to the caller.
    #[error("validation error: {0}")]
    Validation(String),

    /// Shared-password gate failures (missing or incorrect password hash).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A stored image or history entry could not be resolved.
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage backend errors (database connection, query failure, file I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Image-generation provider errors. `status` carries the upstream HTTP
    /// status when one was received, so the gateway can pass it through.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
