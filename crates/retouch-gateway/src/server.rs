// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router construction and server startup.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use retouch_core::RetouchError;
use retouch_cost::TokenRates;
use retouch_provider::ImageEditClient;
use retouch_store::HistoryCache;

use crate::auth::PasswordGate;
use crate::handlers;

/// Largest accepted request body. Ten source images plus a mask fit
/// comfortably; anything larger is rejected before buffering.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<HistoryCache>,
    pub client: ImageEditClient,
    pub gate: PasswordGate,
    pub rates: TokenRates,
}

/// Build the API router.
///
/// The playground UI is served from another origin during development, so
/// CORS is wide open.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth-status", get(handlers::auth_status))
        .route("/api/images", post(handlers::create_images))
        .route("/api/image/{filename}", get(handlers::get_image))
        .route("/api/image-delete", post(handlers::delete_images))
        .route("/api/history", get(handlers::get_history))
        .route("/api/history-clear", post(handlers::clear_history))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the task is cancelled.
pub async fn start_server(host: &str, port: u16, state: AppState) -> Result<(), RetouchError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RetouchError::Config(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "gateway listening");

    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| RetouchError::Internal(format!("server error: {e}")))
}
