// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `dunner-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate, plus the aggregate row types only storage produces.

pub use dunner_core::types::{
    AutomationRunLog, Campaign, OptOutEntry, OperatorEmailSettings, SendRecord, SendStatus,
    SystemSettings,
};

/// Per-(invoice, campaign) aggregate over `sent` records, used by the
/// eligibility resolver. One GROUP BY query per run instead of a query per
/// candidate pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SentSummary {
    pub invoice_id: i64,
    pub campaign_id: i64,
    /// Most recent `sent_at` among sent records for the pair.
    pub last_sent_at: String,
    /// Count of sent records for the pair. Failed attempts are excluded.
    pub sent_count: i64,
}
