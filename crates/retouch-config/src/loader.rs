// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./retouch.toml` > `~/.config/retouch/retouch.toml`
//! > `/etc/retouch/retouch.toml` with environment variable overrides via the
//! `RETOUCH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RetouchConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/retouch/retouch.toml` (system-wide)
/// 3. `~/.config/retouch/retouch.toml` (user XDG config)
/// 4. `./retouch.toml` (local directory)
/// 5. `RETOUCH_*` environment variables
pub fn load_config() -> Result<RetouchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RetouchConfig::default()))
        .merge(Toml::file("/etc/retouch/retouch.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("retouch/retouch.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("retouch.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used in tests and anywhere config content is supplied directly.
pub fn load_config_from_str(toml_content: &str) -> Result<RetouchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RetouchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RetouchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RetouchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores stay intact: `RETOUCH_PROVIDER_API_KEY` must map to
/// `provider.api_key`, not `provider.api.key`.
fn env_provider() -> Env {
    Env::prefixed("RETOUCH_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("provider_", "provider.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("auth_", "auth.", 1);
        mapped.into()
    })
}
