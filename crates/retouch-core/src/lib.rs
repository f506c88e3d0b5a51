// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Retouch image playground.
//!
//! This crate provides the shared domain types (batches, storage modes,
//! token usage, cost breakdowns) and the error type used throughout the
//! Retouch workspace.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RetouchError;
pub use types::{
    BatchImage, BatchMode, CostBreakdown, GenerationBatch, ImageRef, ImageSize, OutputFormat,
    Quality, StorageMode, TokenUsage,
};
