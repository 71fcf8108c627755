// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core trait definitions, error types, and domain model for the Dunner
//! collection engine.
//!
//! Everything that crosses a crate boundary lives here: the `DunnerError`
//! taxonomy, the invoice/campaign/send-record domain model, and the two
//! external-collaborator seams (`InvoiceFeed`, `MailTransport`).

pub mod error;
pub mod traits;
pub mod types;

pub use error::DunnerError;
pub use traits::{InvoiceFeed, MailTransport};
pub use types::*;
