// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Dunner collection engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Dunner configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DunnerConfig {
    /// Engine behavior settings (timezone, concurrency, schedule).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound SMTP transport settings.
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Invoice feed (order-of-record system) settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Gateway HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Operator timezone as a fixed UTC offset in minutes.
    ///
    /// Rate-limit day/hour buckets are computed in this offset so the daily
    /// cap resets at the operator's midnight, not UTC midnight.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Maximum concurrent transport attempts during the dispatch fan-out.
    /// Kept well under the hourly cap; network I/O dominates latency.
    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,

    /// Per-attempt transport timeout in seconds. Timeout is treated
    /// identically to transport failure.
    #[serde(default = "default_transport_timeout_secs")]
    pub transport_timeout_secs: u64,

    /// Cron expression for scheduled runs (business-day cadence).
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Enable the scheduler loop in `dunner serve`. Manual runs via the
    /// gateway or CLI work regardless.
    #[serde(default = "default_schedule_enabled")]
    pub schedule_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            utc_offset_minutes: 0,
            dispatch_concurrency: default_dispatch_concurrency(),
            transport_timeout_secs: default_transport_timeout_secs(),
            schedule: default_schedule(),
            schedule_enabled: default_schedule_enabled(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_dispatch_concurrency() -> usize {
    4
}

fn default_transport_timeout_secs() -> u64 {
    30
}

fn default_schedule() -> String {
    // 09:00 and 13:00 on business days.
    "0 0 9,13 * * MON-FRI".to_string()
}

fn default_schedule_enabled() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dunner").join("dunner.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("dunner.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Outbound SMTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// SMTP relay port (465 for implicit TLS, 587 for STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// SMTP username. `None` disables authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,

    /// Use implicit TLS (SMTPS) instead of STARTTLS.
    #[serde(default = "default_implicit_tls")]
    pub implicit_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            implicit_tls: default_implicit_tls(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_implicit_tls() -> bool {
    true
}

/// Invoice feed configuration.
///
/// Points at the read-only outstanding-invoice endpoint of the external
/// order-of-record system.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Base URL of the invoice feed API. `None` disables live runs
    /// (preview against an empty snapshot still works).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the feed API.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Invoices per page when paginating the snapshot.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_feed_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            page_size: default_page_size(),
            request_timeout_secs: default_feed_timeout_secs(),
        }
    }
}

fn default_page_size() -> u32 {
    200
}

fn default_feed_timeout_secs() -> u64 {
    30
}

/// Gateway HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Enable the gateway HTTP server.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token for API auth. `None` disables authentication
    /// (only sensible behind a trusted reverse proxy).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8480
}
