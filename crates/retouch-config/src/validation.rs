// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, recognized storage modes, and
//! non-empty paths. Collects all errors instead of failing fast.

use std::str::FromStr;

use retouch_core::StorageMode;

use crate::diagnostic::ConfigError;
use crate::model::RetouchConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors.
pub fn validate_config(config: &RetouchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if let Some(mode) = &config.storage.mode
        && StorageMode::from_str(mode).is_err()
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "storage.mode `{mode}` is not recognized; use `filesystem` or `embedded-db`"
            ),
        });
    }

    if config.storage.output_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.output_dir must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.history_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.history_path must not be empty".to_string(),
        });
    }

    if config.provider.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "provider.base_url must not be empty".to_string(),
        });
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(password) = &config.auth.password
        && password.is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "auth.password must not be empty; omit it to disable the gate".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = RetouchConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_storage_mode_fails_validation() {
        let mut config = RetouchConfig::default();
        config.storage.mode = Some("cloud".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("storage.mode"))
        ));
    }

    #[test]
    fn known_storage_modes_pass() {
        for mode in ["filesystem", "embedded-db"] {
            let mut config = RetouchConfig::default();
            config.storage.mode = Some(mode.to_string());
            assert!(validate_config(&config).is_ok(), "{mode}");
        }
    }

    #[test]
    fn empty_output_dir_fails_validation() {
        let mut config = RetouchConfig::default();
        config.storage.output_dir = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("output_dir"))
        ));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = RetouchConfig::default();
        config.provider.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("timeout_secs"))
        ));
    }

    #[test]
    fn empty_password_fails_validation() {
        let mut config = RetouchConfig::default();
        config.auth.password = Some("".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("auth.password"))
        ));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = RetouchConfig::default();
        config.server.host = "".to_string();
        config.storage.database_path = "".to_string();
        config.provider.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
