// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the external image-generation provider.
//!
//! Wraps the provider's multipart `/images/edits` endpoint with bearer
//! authentication, response decoding, and classified retry via
//! [`retouch_backoff`].

pub mod client;
pub mod types;

pub use client::{classify, ApiError, ImageEditClient};
pub use types::{
    EditRequest, GeneratedImage, ImagesResponse, SourceImage, MAX_IMAGES_PER_REQUEST,
};
