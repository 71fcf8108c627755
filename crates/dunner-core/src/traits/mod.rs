// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the engine's external collaborators.
//!
//! The invoice feed and the mail transport are the only two systems the
//! engine talks to outside its own database. Both use `#[async_trait]`
//! for dynamic dispatch so tests and dry-runs can substitute doubles.

pub mod feed;
pub mod transport;

pub use feed::InvoiceFeed;
pub use transport::MailTransport;
