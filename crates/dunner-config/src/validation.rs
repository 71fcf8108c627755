// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all errors rather than failing fast.

use crate::diagnostic::ConfigError;
use crate::model::DunnerConfig;

/// Largest plausible fixed UTC offset, in minutes (UTC+14 / UTC-12 both fit).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &DunnerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.engine.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
                config.engine.utc_offset_minutes
            ),
        });
    }

    if config.engine.dispatch_concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.dispatch_concurrency must be at least 1".to_string(),
        });
    }

    if config.engine.transport_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.transport_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.engine.schedule.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "engine.schedule must not be empty".to_string(),
        });
    }

    if config.smtp.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "smtp.host must not be empty".to_string(),
        });
    }

    // Credentials must come in pairs.
    if config.smtp.username.is_some() != config.smtp.password.is_some() {
        errors.push(ConfigError::Validation {
            message: "smtp.username and smtp.password must be set together".to_string(),
        });
    }

    if let Some(url) = &config.feed.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("feed.base_url must be an http(s) URL, got `{url}`"),
            });
        }
    }

    if config.feed.page_size == 0 {
        errors.push(ConfigError::Validation {
            message: "feed.page_size must be at least 1".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DunnerConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_rejected() {
        let mut config = DunnerConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("database_path")));
    }

    #[test]
    fn out_of_range_utc_offset_rejected() {
        let mut config = DunnerConfig::default();
        config.engine.utc_offset_minutes = 2000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_dispatch_concurrency_rejected() {
        let mut config = DunnerConfig::default();
        config.engine.dispatch_concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unpaired_smtp_credentials_rejected() {
        let mut config = DunnerConfig::default();
        config.smtp.username = Some("mailer".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("smtp.username")));
    }

    #[test]
    fn non_http_feed_url_rejected() {
        let mut config = DunnerConfig::default();
        config.feed.base_url = Some("ftp://brightpearl.example".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn multiple_errors_collected() {
        let mut config = DunnerConfig::default();
        config.storage.database_path = String::new();
        config.engine.dispatch_concurrency = 0;
        config.feed.page_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
