// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared domain types for generation batches, storage modes, and cost accounting.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which backend holds a batch's image bytes.
///
/// Resolved once at startup (explicit override > managed-platform detection >
/// filesystem default) and injected into every component that needs it. History
/// entries record the mode they were written under, so reads dispatch on the
/// recorded mode rather than the current one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum StorageMode {
    /// Bytes live as files under the configured output directory and are
    /// served back by path.
    #[serde(rename = "filesystem")]
    #[strum(serialize = "filesystem")]
    Filesystem,
    /// Bytes live as blobs in the embedded SQLite database, keyed by filename.
    #[serde(rename = "embedded-db")]
    #[strum(serialize = "embedded-db")]
    Embedded,
}

/// Requested output quality. `Auto` is omitted from the outbound API call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
    #[default]
    Auto,
}

/// Requested output size. `Auto` is omitted from the outbound API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageSize {
    #[serde(rename = "auto")]
    #[default]
    Auto,
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1536x1024")]
    Landscape,
    #[serde(rename = "1024x1536")]
    Portrait,
}

impl ImageSize {
    /// The wire value sent to the provider, or `None` for `Auto`.
    pub fn as_api_value(&self) -> Option<&'static str> {
        match self {
            ImageSize::Auto => None,
            ImageSize::Square => Some("1024x1024"),
            ImageSize::Landscape => Some("1536x1024"),
            ImageSize::Portrait => Some("1024x1536"),
        }
    }
}

impl std::str::FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ImageSize::Auto),
            "1024x1024" => Ok(ImageSize::Square),
            "1536x1024" => Ok(ImageSize::Landscape),
            "1024x1536" => Ok(ImageSize::Portrait),
            other => Err(format!("unknown image size `{other}`")),
        }
    }
}

/// Output format for generated images.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    /// Normalize a client-supplied format string. `jpg` maps to `jpeg`;
    /// anything unrecognized falls back to `png`.
    pub fn normalize(raw: Option<&str>) -> Self {
        let lower = raw.unwrap_or("png").to_lowercase();
        match lower.as_str() {
            "jpeg" | "jpg" => OutputFormat::Jpeg,
            "webp" => OutputFormat::Webp,
            _ => OutputFormat::Png,
        }
    }

    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
        }
    }

    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

/// Token usage reported by the provider for one generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt text tokens consumed.
    #[serde(default)]
    pub text_input_tokens: u64,
    /// Source/mask image tokens consumed.
    #[serde(default)]
    pub image_input_tokens: u64,
    /// Generated image tokens produced.
    #[serde(default)]
    pub image_output_tokens: u64,
}

/// Cost breakdown derived from a [`TokenUsage`] and fixed per-token rates.
///
/// Never persisted independently; always embedded in a [`GenerationBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub text_input_cost: f64,
    pub image_input_cost: f64,
    pub image_output_cost: f64,
    pub total_cost: f64,
}

/// A single image belonging to a generation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchImage {
    pub filename: String,
}

/// The kind of request that produced a batch. Only edits are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    #[default]
    Edit,
}

/// One generation/edit request's resulting set of images plus metadata.
///
/// Created when a generation call succeeds and immutable thereafter except for
/// deletion. Persisted as an ordered list, newest first; `timestamp` (ms epoch)
/// is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationBatch {
    pub timestamp: i64,
    pub images: Vec<BatchImage>,
    pub storage_mode_used: StorageMode,
    pub duration_ms: u64,
    pub quality: Quality,
    pub prompt: String,
    #[serde(default)]
    pub mode: BatchMode,
    pub cost_details: Option<CostBreakdown>,
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// A resolved reference to a stored image, tagged by the backend that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ImageRef {
    /// Served from disk via the retrieval path.
    Filesystem { path: String },
    /// Looked up as a blob in the embedded database.
    Embedded { filename: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_normalizes_jpg_to_jpeg() {
        assert_eq!(OutputFormat::normalize(Some("jpg")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::normalize(Some("JPEG")), OutputFormat::Jpeg);
    }

    #[test]
    fn output_format_falls_back_to_png() {
        assert_eq!(OutputFormat::normalize(Some("tiff")), OutputFormat::Png);
        assert_eq!(OutputFormat::normalize(None), OutputFormat::Png);
        assert_eq!(OutputFormat::normalize(Some("")), OutputFormat::Png);
    }

    #[test]
    fn output_format_mime_types() {
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Webp.mime_type(), "image/webp");
    }

    #[test]
    fn image_size_api_values() {
        assert_eq!(ImageSize::Auto.as_api_value(), None);
        assert_eq!(ImageSize::Square.as_api_value(), Some("1024x1024"));
        assert_eq!(ImageSize::Landscape.as_api_value(), Some("1536x1024"));
        assert_eq!(ImageSize::Portrait.as_api_value(), Some("1024x1536"));
    }

    #[test]
    fn image_size_parses_wire_values() {
        assert_eq!("1536x1024".parse::<ImageSize>().unwrap(), ImageSize::Landscape);
        assert!("800x600".parse::<ImageSize>().is_err());
    }

    #[test]
    fn generation_batch_round_trips_through_json() {
        let batch = GenerationBatch {
            timestamp: 1_700_000_000_000,
            images: vec![BatchImage {
                filename: "1700000000000-0.png".into(),
            }],
            storage_mode_used: StorageMode::Embedded,
            duration_ms: 1234,
            quality: Quality::Auto,
            prompt: "add a hat".into(),
            mode: BatchMode::Edit,
            cost_details: Some(CostBreakdown {
                text_input_cost: 0.0001,
                image_input_cost: 0.001,
                image_output_cost: 0.04,
                total_cost: 0.0411,
            }),
            output_format: OutputFormat::Png,
        };

        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains("\"storage_mode_used\":\"embedded-db\""));
        assert!(json.contains("\"quality\":\"auto\""));
        assert!(json.contains("\"mode\":\"edit\""));

        let parsed: GenerationBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.timestamp, batch.timestamp);
        assert_eq!(parsed.images, batch.images);
        assert_eq!(parsed.storage_mode_used, StorageMode::Embedded);
    }

    #[test]
    fn image_ref_is_tagged_by_kind() {
        let fs = ImageRef::Filesystem {
            path: "/api/image/a.png".into(),
        };
        let json = serde_json::to_string(&fs).unwrap();
        assert!(json.contains("\"kind\":\"filesystem\""));

        let emb = ImageRef::Embedded {
            filename: "a.png".into(),
        };
        let json = serde_json::to_string(&emb).unwrap();
        assert!(json.contains("\"kind\":\"embedded\""));
    }
}
