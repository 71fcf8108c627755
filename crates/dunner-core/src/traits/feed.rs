// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice feed trait: read-only pull source for outstanding invoices.

use async_trait::async_trait;

use crate::error::DunnerError;
use crate::types::Invoice;

/// Read-only view of the external order-of-record system.
///
/// The engine pulls a full snapshot at run start and re-checks individual
/// invoices immediately before dispatch (an invoice paid between snapshot
/// and send time must never be emailed).
#[async_trait]
pub trait InvoiceFeed: Send + Sync {
    /// Fetch the current snapshot of outstanding (unpaid/partial) invoices.
    ///
    /// `days_outstanding` is recomputed by the feed for every snapshot.
    async fn outstanding_invoices(&self) -> Result<Vec<Invoice>, DunnerError>;

    /// Re-fetch a single invoice by id. Returns `None` if it no longer
    /// exists in the source system.
    async fn invoice(&self, id: i64) -> Result<Option<Invoice>, DunnerError>;
}
