// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dunner.toml` > `~/.config/dunner/dunner.toml` > `/etc/dunner/dunner.toml`
//! with environment variable overrides via `DUNNER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DunnerConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dunner/dunner.toml` (system-wide)
/// 3. `~/.config/dunner/dunner.toml` (user XDG config)
/// 4. `./dunner.toml` (local directory)
/// 5. `DUNNER_*` environment variables
pub fn load_config() -> Result<DunnerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DunnerConfig::default()))
        .merge(Toml::file("/etc/dunner/dunner.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dunner/dunner.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dunner.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DunnerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DunnerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DunnerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DunnerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `DUNNER_SMTP_IMPLICIT_TLS`
/// must map to `smtp.implicit_tls`, not `smtp.implicit.tls`.
pub fn env_provider() -> Env {
    Env::prefixed("DUNNER_").map(|key| {
        // `map` receives the stripped key in its original case
        // (e.g. "STORAGE_DATABASE_PATH"); lowercase before matching the
        // section prefixes or no replacement ever fires.
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("engine_", "engine.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("smtp_", "smtp.", 1)
            .replacen("feed_", "feed.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
