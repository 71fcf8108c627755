// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail transport trait: the outbound delivery seam.

use async_trait::async_trait;

use crate::error::DunnerError;
use crate::types::EmailMessage;

/// Abstraction over an outbound email transport.
///
/// Object-safe so callers can hold `Arc<dyn MailTransport>`. Production
/// uses the SMTP implementation; dry-runs log, tests capture in memory.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. A timeout is applied by the caller; any error
    /// (including timeout) marks the corresponding send record failed and
    /// is never retried within the same run.
    async fn deliver(&self, message: &EmailMessage) -> Result<(), DunnerError>;
}
