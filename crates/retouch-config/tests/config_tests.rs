// SPDX-FileCopyrightText: 2026 Retouch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Retouch configuration system.

use retouch_config::diagnostic::{suggest_key, ConfigError};
use retouch_config::model::RetouchConfig;
use retouch_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_retouch_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[provider]
api_key = "sk-test-123"
base_url = "https://api.example.com/v1"
model = "gpt-image-1"
timeout_secs = 90
max_retries = 5
retry_base_delay_ms = 500

[storage]
mode = "embedded-db"
output_dir = "/tmp/images"
database_path = "/tmp/retouch.db"
history_path = "/tmp/history.json"

[auth]
password = "hunter2"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-test-123"));
    assert_eq!(config.provider.base_url, "https://api.example.com/v1");
    assert_eq!(config.provider.timeout_secs, 90);
    assert_eq!(config.provider.max_retries, 5);
    assert_eq!(config.provider.retry_base_delay_ms, 500);
    assert_eq!(config.storage.mode.as_deref(), Some("embedded-db"));
    assert_eq!(config.storage.output_dir, "/tmp/images");
    assert_eq!(config.storage.database_path, "/tmp/retouch.db");
    assert_eq!(config.storage.history_path, "/tmp/history.json");
    assert_eq!(config.auth.password.as_deref(), Some("hunter2"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let toml = "";
    let config = load_config_from_str(toml).expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.log_level, "info");
    assert!(config.provider.api_key.is_none());
    assert_eq!(config.provider.model, "gpt-image-1");
    assert_eq!(config.provider.timeout_secs, 60);
    assert!(config.storage.mode.is_none());
    assert!(!config.storage.managed_platform);
    assert!(config.auth.password.is_none());
}

/// Unknown field in [provider] section produces an error.
#[test]
fn unknown_field_in_provider_produces_error() {
    let toml = r#"
[provider]
api_kye = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("api_kye"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err =
        load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Dot-notation overrides (as produced by the env provider) win over TOML.
#[test]
fn dotted_override_wins_over_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[server]
port = 3000
"#;

    let config: RetouchConfig = Figment::new()
        .merge(Serialized::defaults(RetouchConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("server.port", 9090))
        .extract()
        .expect("should merge override");

    assert_eq!(config.server.port, 9090);
}

/// provider.api_key can be supplied via dot notation without any TOML file,
/// matching the RETOUCH_PROVIDER_API_KEY env mapping.
#[test]
fn api_key_via_dotted_override() {
    use figment::{providers::Serialized, Figment};

    let config: RetouchConfig = Figment::new()
        .merge(Serialized::defaults(RetouchConfig::default()))
        .merge(("provider.api_key", "sk-from-env"))
        .extract()
        .expect("should set api_key via dot notation");

    assert_eq!(config.provider.api_key.as_deref(), Some("sk-from-env"));
}

/// Missing config files are silently skipped (Figment's Toml::file behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: RetouchConfig = Figment::new()
        .merge(Serialized::defaults(RetouchConfig::default()))
        .merge(Toml::file("/nonexistent/path/retouch.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.host, "127.0.0.1");
}

// ============================================================================
// Diagnostic tests
// ============================================================================

/// Unknown key "passwrd" in [auth] produces suggestion "did you mean `password`?"
#[test]
fn diagnostic_passwrd_suggests_password() {
    let errors = load_and_validate_str(
        r#"
[auth]
passwrd = "abc"
"#,
    )
    .expect_err("should produce errors");

    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, .. } if {
            key == "passwrd" && suggestion.as_deref() == Some("password")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'passwrd' with suggestion 'password', got: {errors:?}"
    );
}

/// Error output includes the list of valid keys for the section.
#[test]
fn diagnostic_error_includes_valid_keys() {
    let errors = load_and_validate_str(
        r#"
[storage]
outptu_dir = "/tmp"
"#,
    )
    .expect_err("should produce errors");

    let has_valid_keys = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { valid_keys, .. } if {
            valid_keys.contains("output_dir") && valid_keys.contains("database_path")
        })
    });
    assert!(
        has_valid_keys,
        "error should list valid keys for [storage] section"
    );
}

/// Invalid type (string where number expected) produces a clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[server]
port = "not_a_number"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("port"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError implements miette::Diagnostic with code and help text.
#[test]
fn config_error_implements_diagnostic() {
    use miette::Diagnostic;

    let error = ConfigError::UnknownKey {
        key: "passwrd".to_string(),
        suggestion: Some("password".to_string()),
        valid_keys: "password".to_string(),
    };

    assert!(error.code().is_some(), "should have diagnostic code");

    let help = error.help().expect("should have help text").to_string();
    assert!(
        help.contains("did you mean `password`"),
        "help should contain suggestion, got: {help}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::GraphicalReportHandler;

    let error = ConfigError::UnknownKey {
        key: "passwrd".to_string(),
        suggestion: Some("password".to_string()),
        valid_keys: "password".to_string(),
    };

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(!buf.is_empty(), "rendered report should not be empty");
    assert!(buf.contains("passwrd"), "rendered report should mention the key");
}

/// suggest_key finds close matches and rejects distant ones.
#[test]
fn suggest_key_threshold_behavior() {
    let valid = &["host", "port", "log_level"];
    assert_eq!(suggest_key("prot", valid), Some("port".to_string()));
    assert_eq!(suggest_key("zzzzzz", valid), None);
}

/// load_and_validate_str with valid TOML returns Ok config.
#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[server]
host = "0.0.0.0"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.server.host, "0.0.0.0");
}

/// Validation catches an unrecognized storage mode string.
#[test]
fn validation_catches_bad_storage_mode() {
    let toml = r#"
[storage]
mode = "s3"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad storage mode should fail");
    let has_validation_error = errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("storage.mode"))
    });
    assert!(
        has_validation_error,
        "should have validation error for unrecognized storage mode"
    );
}
