// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Retouch server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Retouch configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetouchConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Image-generation provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Shared-password gate settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Image-generation provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Provider API key. `None` requires an environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the provider API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier for image edits.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds. Image generation is slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient provider failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-image-1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    2000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Explicit storage mode override: "filesystem" or "embedded-db".
    /// `None` enables managed-platform detection.
    #[serde(default)]
    pub mode: Option<String>,

    /// Directory for filesystem-mode image files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Path to the SQLite database file used in embedded-db mode.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Path to the server-side history log file.
    #[serde(default = "default_history_path")]
    pub history_path: String,

    /// Treat the environment as a managed platform (ephemeral filesystem).
    /// Normally detected from the environment; settable for testing.
    #[serde(default)]
    pub managed_platform: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: None,
            output_dir: default_output_dir(),
            database_path: default_database_path(),
            history_path: default_history_path(),
            managed_platform: false,
        }
    }
}

fn default_output_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("retouch").join("images"))
        .unwrap_or_else(|| std::path::PathBuf::from("images"))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("retouch").join("retouch.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("retouch.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_history_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("retouch").join("history.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("history.json"))
        .to_string_lossy()
        .into_owned()
}

/// Shared-password gate configuration.
///
/// The gate compares an unsalted SHA-256 hex digest of this password against
/// the hash clients submit. It is a casual access gate, not account security.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared password. `None` disables the gate entirely.
    #[serde(default)]
    pub password: Option<String>,
}
