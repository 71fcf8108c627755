// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dunner collection engine.

use thiserror::Error;

/// The primary error type used across all Dunner crates.
///
/// The variants mirror the engine's failure taxonomy: configuration errors
/// are per-campaign and non-fatal to a run, transport errors are per-send,
/// feed errors abort a run before any send, and `RunActive` rejects a
/// concurrent trigger without queuing.
#[derive(Debug, Error)]
pub enum DunnerError {
    /// Configuration errors (invalid TOML, missing required fields, bad campaign definition).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invoice feed errors (source unavailable, malformed page, HTTP failure).
    #[error("feed error: {message}")]
    Feed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Mail transport errors (provider rejection, connection failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A run is already active; the new trigger is rejected, never queued.
    #[error("an automation run is already active")]
    RunActive,

    /// An in-flight run was cancelled by external signal.
    #[error("run cancelled: {reason}")]
    Cancelled { reason: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DunnerError {
    /// Build a feed error from a message only.
    pub fn feed(message: impl Into<String>) -> Self {
        Self::Feed {
            message: message.into(),
            source: None,
        }
    }

    /// Build a transport error from a message only.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }
}
