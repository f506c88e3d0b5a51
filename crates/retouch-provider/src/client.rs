// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the image edit endpoint.
//!
//! Provides [`ImageEditClient`] which handles multipart request construction,
//! bearer authentication, and retry with classified backoff for transient
//! failures.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use retouch_backoff::{classify_message, ErrorClass, RetryPolicy};
use retouch_core::RetouchError;

use crate::types::{ApiErrorResponse, EditRequest, ImagesResponse};

/// Error from one attempt against the provider, carrying enough context to
/// classify it for retry.
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    /// Whether the request failed before any HTTP status was received.
    pub transport: bool,
}

impl ApiError {
    fn from_transport(err: reqwest::Error) -> Self {
        // Surface the condition in a classifiable message. reqwest does not
        // expose errno strings, so timeouts and connect failures are mapped
        // to the signatures the classifier knows.
        let detail = if err.is_timeout() {
            format!("ETIMEDOUT: {err}")
        } else if err.is_connect() {
            format!("Connection error: {err}")
        } else {
            err.to_string()
        };
        Self {
            message: detail,
            status: None,
            code: None,
            transport: true,
        }
    }
}

impl From<ApiError> for RetouchError {
    fn from(err: ApiError) -> Self {
        RetouchError::Provider {
            message: err.message,
            status: err.status,
            source: None,
        }
    }
}

/// Classify an attempt error for the retry loop.
///
/// Transport failures count as connection errors. HTTP 429 and the
/// `rate_limit_exceeded` error code are rate limits regardless of message
/// text; everything else falls back to message-substring classification.
pub fn classify(err: &ApiError) -> ErrorClass {
    if err.status == Some(429) || err.code.as_deref() == Some("rate_limit_exceeded") {
        return ErrorClass::RateLimit;
    }
    let by_message = classify_message(&err.message);
    if by_message != ErrorClass::Fatal {
        return by_message;
    }
    if err.transport {
        return ErrorClass::Connection;
    }
    ErrorClass::Fatal
}

/// HTTP client for the provider's image edit endpoint.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ImageEditClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    policy: RetryPolicy,
}

impl ImageEditClient {
    /// Create a client authenticated with the given API key.
    ///
    /// `timeout` bounds each individual attempt; image generation regularly
    /// takes tens of seconds, so callers should pass a generous value.
    pub fn new(
        api_key: &str,
        base_url: String,
        model: String,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self, RetouchError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| RetouchError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RetouchError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            model,
            policy,
        })
    }

    /// The model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Submit an edit request, retrying transient failures per the policy.
    ///
    /// Validation-style provider errors (4xx other than 429) are returned
    /// immediately without retrying.
    pub async fn edit(&self, request: &EditRequest) -> Result<ImagesResponse, RetouchError> {
        let result = self
            .policy
            .run(classify, || self.attempt(request))
            .await;
        result.map_err(Into::into)
    }

    /// One attempt: build the multipart form, send, and decode the response.
    async fn attempt(&self, request: &EditRequest) -> Result<ImagesResponse, ApiError> {
        let url = format!("{}/images/edits", self.base_url);
        let form = self.build_form(request);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        debug!(status = %status, n = request.n(), "edit response received");

        let body = response.text().await.map_err(ApiError::from_transport)?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| ApiError {
                message: format!("failed to parse provider response: {e}"),
                status: Some(status.as_u16()),
                code: None,
                transport: false,
            });
        }

        let (message, code) = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => (api_err.error.message, api_err.error.code),
            Err(_) => (format!("provider returned {status}: {body}"), None),
        };
        warn!(status = %status, code = ?code, "provider error");
        Err(ApiError {
            message,
            status: Some(status.as_u16()),
            code,
            transport: false,
        })
    }

    /// Encode the request as a multipart form.
    ///
    /// `size` and `quality` are omitted entirely when set to auto; the
    /// provider then picks its own defaults.
    fn build_form(&self, request: &EditRequest) -> Form {
        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("prompt", request.prompt.clone())
            .text("n", request.n().to_string());

        if let Some(size) = request.size.as_api_value() {
            form = form.text("size", size);
        }
        if request.quality != retouch_core::Quality::Auto {
            form = form.text("quality", request.quality.to_string());
        }

        for (i, image) in request.images.iter().enumerate() {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.filename.clone())
                .mime_str(&image.mime_type)
                .unwrap_or_else(|_| {
                    Part::bytes(image.bytes.clone()).file_name(image.filename.clone())
                });
            form = form.part(format!("image[{i}]"), part);
        }

        if let Some(mask) = &request.mask {
            let part = Part::bytes(mask.clone())
                .file_name("mask.png")
                .mime_str("image/png")
                .unwrap_or_else(|_| Part::bytes(mask.clone()).file_name("mask.png"));
            form = form.part("mask", part);
        }

        form
    }
}
