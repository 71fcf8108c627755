// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Dunner configuration system.

use dunner_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_dunner_config() {
    let toml = r#"
[engine]
log_level = "debug"
utc_offset_minutes = 60
dispatch_concurrency = 2
transport_timeout_secs = 10
schedule = "0 0 8 * * MON-FRI"

[storage]
database_path = "/tmp/dunner-test.db"
wal_mode = false

[smtp]
host = "mail.example.com"
port = 587
username = "mailer"
password = "hunter2"
implicit_tls = false

[feed]
base_url = "https://feed.example.com/api"
api_token = "bp-token"
page_size = 100

[gateway]
enabled = true
host = "0.0.0.0"
port = 9000
bearer_token = "secret"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.engine.log_level, "debug");
    assert_eq!(config.engine.utc_offset_minutes, 60);
    assert_eq!(config.engine.dispatch_concurrency, 2);
    assert_eq!(config.engine.schedule, "0 0 8 * * MON-FRI");
    assert_eq!(config.storage.database_path, "/tmp/dunner-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.smtp.host, "mail.example.com");
    assert_eq!(config.smtp.port, 587);
    assert_eq!(config.smtp.username.as_deref(), Some("mailer"));
    assert!(!config.smtp.implicit_tls);
    assert_eq!(
        config.feed.base_url.as_deref(),
        Some("https://feed.example.com/api")
    );
    assert_eq!(config.feed.page_size, 100);
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("secret"));
}

/// Unknown field in a section produces a deserialization error.
#[test]
fn unknown_field_in_smtp_produces_error() {
    let toml = r#"
[smtp]
hosst = "mail.example.com"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("hosst"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.engine.log_level, "info");
    assert_eq!(config.engine.utc_offset_minutes, 0);
    assert_eq!(config.engine.dispatch_concurrency, 4);
    assert_eq!(config.engine.schedule, "0 0 9,13 * * MON-FRI");
    assert!(config.engine.schedule_enabled);
    assert!(config.storage.wal_mode);
    assert_eq!(config.smtp.host, "localhost");
    assert_eq!(config.smtp.port, 465);
    assert!(config.smtp.username.is_none());
    assert!(config.feed.base_url.is_none());
    assert_eq!(config.feed.page_size, 200);
    assert!(config.gateway.enabled);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8480);
    assert!(config.gateway.bearer_token.is_none());
}

/// load_and_validate_str rejects semantically invalid values even when the
/// TOML deserializes cleanly.
#[test]
fn validation_rejects_semantic_errors() {
    let toml = r#"
[engine]
dispatch_concurrency = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(
        errors
            .iter()
            .any(|e| e.to_string().contains("dispatch_concurrency"))
    );
}

/// `DUNNER_*` environment variables override file values through the
/// loader's own provider. Env var names arrive uppercased, so the
/// section mapping must be case-insensitive. Serialized: mutates
/// process env.
#[test]
#[serial_test::serial]
fn env_var_overrides_storage_path() {
    use figment::providers::{Format, Serialized, Toml};
    use figment::{Figment, Jail};

    Jail::expect_with(|jail| {
        jail.set_env("DUNNER_STORAGE_DATABASE_PATH", "/tmp/env-override.db");
        // Underscore inside the key name: must map to smtp.implicit_tls.
        jail.set_env("DUNNER_SMTP_IMPLICIT_TLS", "false");

        let config: dunner_config::DunnerConfig = Figment::new()
            .merge(Serialized::defaults(dunner_config::DunnerConfig::default()))
            .merge(Toml::string("[storage]\ndatabase_path = \"/tmp/file.db\""))
            .merge(dunner_config::env_provider())
            .extract()?;

        assert_eq!(config.storage.database_path, "/tmp/env-override.db");
        assert!(!config.smtp.implicit_tls);
        Ok(())
    });
}
