// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the image edit endpoint.

use base64::Engine;
use serde::Deserialize;

use retouch_core::{ImageSize, Quality, RetouchError, TokenUsage};

/// Maximum number of images a single request may ask for.
pub const MAX_IMAGES_PER_REQUEST: u32 = 10;

/// One source image uploaded by the client.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// An image edit request, before multipart encoding.
///
/// `n` is clamped to 1..=10 at construction so an out-of-range count never
/// reaches the wire.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub prompt: String,
    pub images: Vec<SourceImage>,
    pub mask: Option<Vec<u8>>,
    n: u32,
    pub size: ImageSize,
    pub quality: Quality,
}

impl EditRequest {
    /// Build a request, clamping `n` into the valid range.
    pub fn new(
        prompt: String,
        images: Vec<SourceImage>,
        mask: Option<Vec<u8>>,
        n: u32,
        size: ImageSize,
        quality: Quality,
    ) -> Self {
        Self {
            prompt,
            images,
            mask,
            n: n.clamp(1, MAX_IMAGES_PER_REQUEST),
            size,
            quality,
        }
    }

    /// The clamped image count.
    pub fn n(&self) -> u32 {
        self.n
    }
}

/// One generated image in the provider response, base64-encoded.
///
/// A missing `b64_json` is tolerated at parse time so one bad entry cannot
/// sink the whole response; it surfaces as a per-image decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedImage {
    #[serde(default)]
    pub b64_json: String,
}

impl GeneratedImage {
    /// Decode the base64 payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, RetouchError> {
        if self.b64_json.is_empty() {
            return Err(RetouchError::Provider {
                message: "image payload missing from provider response".to_string(),
                status: None,
                source: None,
            });
        }
        base64::engine::general_purpose::STANDARD
            .decode(&self.b64_json)
            .map_err(|e| RetouchError::Provider {
                message: format!("failed to decode image payload: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })
    }
}

/// Successful response from the image edit endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesResponse {
    pub data: Vec<GeneratedImage>,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Error envelope returned by the provider on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Inner error object of an [`ApiErrorResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}
