// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the playground API.
//!
//! Generation requests arrive as multipart forms (text fields plus image
//! files); everything else is JSON. Domain errors map onto HTTP statuses in
//! one place, [`ApiFailure`].

use std::time::Instant;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use retouch_core::{
    GenerationBatch, ImageSize, OutputFormat, Quality, RetouchError, StorageMode, TokenUsage,
};
use retouch_cost::calculate_cost;
use retouch_mask::validate_mask;
use retouch_provider::{EditRequest, SourceImage};
use retouch_store::{is_safe_filename, NewBatch};

use crate::server::AppState;

/// JSON error envelope returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A handler failure, carrying the domain error for status mapping.
#[derive(Debug)]
pub struct ApiFailure(RetouchError);

impl From<RetouchError> for ApiFailure {
    fn from(err: RetouchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RetouchError::Validation(_) => StatusCode::BAD_REQUEST,
            RetouchError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            RetouchError::NotFound(_) => StatusCode::NOT_FOUND,
            // Provider statuses pass through so the client sees 429 as 429.
            RetouchError::Provider {
                status: Some(code), ..
            } => StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY),
            RetouchError::Provider { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(status = %status, error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: i64,
    pub environment: String,
    pub storage_mode: StorageMode,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        environment: std::env::var("RETOUCH_ENV").unwrap_or_else(|_| "production".to_string()),
        storage_mode: state.cache.mode(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub password_required: bool,
}

pub async fn auth_status(State(state): State<AppState>) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        password_required: state.gate.enabled(),
    })
}

/// The parsed multipart form of a generation request.
#[derive(Debug, Default)]
struct ImagesForm {
    password_hash: Option<String>,
    prompt: Option<String>,
    n: u32,
    size: ImageSize,
    quality: Quality,
    output_format: OutputFormat,
    images: Vec<SourceImage>,
    mask: Option<Vec<u8>>,
}

impl ImagesForm {
    async fn parse(mut multipart: Multipart) -> Result<Self, RetouchError> {
        let mut form = Self {
            n: 1,
            ..Self::default()
        };

        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "password_hash" => {
                    form.password_hash = Some(field.text().await.map_err(malformed)?);
                }
                "prompt" => form.prompt = Some(field.text().await.map_err(malformed)?),
                "n" => {
                    let raw = field.text().await.map_err(malformed)?;
                    form.n = raw.trim().parse().map_err(|_| {
                        RetouchError::Validation(format!("invalid image count `{raw}`"))
                    })?;
                }
                "size" => {
                    let raw = field.text().await.map_err(malformed)?;
                    form.size = raw.parse().map_err(RetouchError::Validation)?;
                }
                "quality" => {
                    let raw = field.text().await.map_err(malformed)?;
                    form.quality = raw.parse().map_err(|_| {
                        RetouchError::Validation(format!("unknown quality `{raw}`"))
                    })?;
                }
                "output_format" => {
                    let raw = field.text().await.map_err(malformed)?;
                    form.output_format = OutputFormat::normalize(Some(&raw));
                }
                "mask" => {
                    form.mask = Some(field.bytes().await.map_err(malformed)?.to_vec());
                }
                // Source images arrive as `image`, `image_0`, `image_1`, ...
                name if name.starts_with("image") => {
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| "upload.png".to_string());
                    let mime_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| {
                            mime_guess::from_path(&filename)
                                .first_or_octet_stream()
                                .to_string()
                        });
                    let bytes = field.bytes().await.map_err(malformed)?.to_vec();
                    form.images.push(SourceImage {
                        filename,
                        mime_type,
                        bytes,
                    });
                }
                other => {
                    warn!(field = other, "ignoring unknown form field");
                }
            }
        }
        Ok(form)
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> RetouchError {
    RetouchError::Validation(format!("malformed multipart body: {e}"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateImagesResponse {
    pub batch: GenerationBatch,
    pub usage: TokenUsage,
    /// How many generated images were stored; `failed` counts payloads that
    /// were generated but could not be persisted.
    pub stored: usize,
    pub failed: usize,
}

/// Run one edit generation: validate, call the provider, store the results.
pub async fn create_images(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CreateImagesResponse>, ApiFailure> {
    let form = ImagesForm::parse(multipart).await?;

    state.gate.verify(form.password_hash.as_deref())?;

    let prompt = form
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| RetouchError::Validation("prompt is required".to_string()))?
        .to_string();

    if form.images.is_empty() {
        return Err(RetouchError::Validation(
            "at least one source image is required".to_string(),
        )
        .into());
    }

    // The mask must match the first source image pixel-for-pixel.
    if let Some(mask) = &form.mask {
        let dims = image::ImageReader::new(std::io::Cursor::new(&form.images[0].bytes))
            .with_guessed_format()
            .map_err(|e| {
                RetouchError::Validation(format!("source image is not readable: {e}"))
            })?
            .into_dimensions()
            .map_err(|e| {
                RetouchError::Validation(format!("source image is not a supported format: {e}"))
            })?;
        validate_mask(mask, dims)?;
    }

    let request = EditRequest::new(
        prompt.clone(),
        form.images,
        form.mask,
        form.n,
        form.size,
        form.quality,
    );

    let started = Instant::now();
    let response = state.client.edit(&request).await?;
    let duration_ms = started.elapsed().as_millis() as u64;

    // One undecodable payload drops that image, not the whole batch.
    let mut payloads = Vec::with_capacity(response.data.len());
    let mut first_decode_error = None;
    for (i, img) in response.data.iter().enumerate() {
        match img.decode() {
            Ok(bytes) => payloads.push(bytes),
            Err(e) => {
                warn!(index = i, error = %e, "dropping undecodable image payload");
                first_decode_error.get_or_insert(e);
            }
        }
    }
    if payloads.is_empty() {
        return Err(first_decode_error
            .unwrap_or_else(|| {
                RetouchError::Provider {
                    message: "provider returned no images".to_string(),
                    status: None,
                    source: None,
                }
            })
            .into());
    }

    let decode_failed = response.data.len() - payloads.len();
    let cost = calculate_cost(&response.usage, &state.rates);
    let outcome = state
        .cache
        .record_batch(NewBatch {
            prompt,
            quality: form.quality,
            output_format: form.output_format,
            duration_ms,
            cost_details: Some(cost),
            payloads,
        })
        .await?;

    info!(
        timestamp = outcome.batch.timestamp,
        stored = outcome.stored,
        failed = outcome.failed,
        duration_ms,
        "batch generated"
    );

    Ok(Json(CreateImagesResponse {
        batch: outcome.batch,
        usage: response.usage,
        stored: outcome.stored,
        failed: outcome.failed + decode_failed,
    }))
}

/// Serve stored image bytes by filename.
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiFailure> {
    if !is_safe_filename(&filename) {
        return Err(RetouchError::Validation(format!(
            "unsafe filename `{filename}`"
        ))
        .into());
    }

    let bytes = state.cache.read_image(&filename).await?;
    let mime = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
        ],
        bytes.to_vec(),
    )
        .into_response())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteImagesRequest {
    pub filenames: Vec<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteImagesResponse {
    pub deleted: usize,
}

/// Delete individual images, trimming them out of their owning batches.
pub async fn delete_images(
    State(state): State<AppState>,
    Json(request): Json<DeleteImagesRequest>,
) -> Result<Json<DeleteImagesResponse>, ApiFailure> {
    state.gate.verify(request.password_hash.as_deref())?;

    if request.filenames.is_empty() {
        return Err(
            RetouchError::Validation("no filenames to delete".to_string()).into(),
        );
    }
    for filename in &request.filenames {
        if !is_safe_filename(filename) {
            return Err(RetouchError::Validation(format!(
                "unsafe filename `{filename}`"
            ))
            .into());
        }
    }

    let deleted = state.cache.delete_files(&request.filenames).await?;
    Ok(Json(DeleteImagesResponse { deleted }))
}

/// The full batch history, newest first.
pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<GenerationBatch>>, ApiFailure> {
    Ok(Json(state.cache.history().await))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    pub cleared: bool,
}

/// Drop all history entries and their stored bytes.
pub async fn clear_history(
    State(state): State<AppState>,
) -> Result<Json<ClearHistoryResponse>, ApiFailure> {
    state.cache.clear().await?;
    Ok(Json(ClearHistoryResponse { cleared: true }))
}
