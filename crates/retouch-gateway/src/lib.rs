// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Retouch image playground.
//!
//! Seven endpoints behind one axum router: health and auth status, image
//! generation, image retrieval and deletion, and history listing/clearing.
//! Generation is optionally gated by a shared password; everything maps
//! domain errors to HTTP statuses in one place.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{sha256_hex, PasswordGate};
pub use server::{build_router, start_server, AppState};
