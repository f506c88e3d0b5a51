// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration into the running server.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use retouch_backoff::RetryPolicy;
use retouch_config::RetouchConfig;
use retouch_core::RetouchError;
use retouch_cost::TokenRates;
use retouch_gateway::{start_server, AppState, PasswordGate};
use retouch_provider::ImageEditClient;
use retouch_store::HistoryCache;

/// Run the API server until interrupted.
pub async fn run(config: RetouchConfig) -> Result<(), RetouchError> {
    let api_key = config.provider.api_key.as_deref().ok_or_else(|| {
        RetouchError::Config(
            "provider.api_key is required to start the server \
             (set RETOUCH_PROVIDER_API_KEY or add it to retouch.toml)"
                .to_string(),
        )
    })?;

    let client = ImageEditClient::new(
        api_key,
        config.provider.base_url.clone(),
        config.provider.model.clone(),
        Duration::from_secs(config.provider.timeout_secs),
        RetryPolicy::new(
            config.provider.max_retries,
            Duration::from_millis(config.provider.retry_base_delay_ms),
        ),
    )?;

    let cache = Arc::new(HistoryCache::open(&config.storage).await?);

    let state = AppState {
        cache: Arc::clone(&cache),
        client,
        gate: PasswordGate::new(config.auth.password.as_deref()),
        rates: TokenRates::default(),
    };

    info!(
        model = %config.provider.model,
        storage_mode = %cache.mode(),
        "starting retouch"
    );

    tokio::select! {
        result = start_server(&config.server.host, config.server.port, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    cache.close().await?;
    Ok(())
}
