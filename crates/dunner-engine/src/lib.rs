// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Eligibility resolution, rate limiting, dispatch routing, and run
//! orchestration for the Dunner collection engine.
//!
//! One orchestrator run is a single sequential unit of work: snapshot the
//! feed, resolve eligible (invoice, campaign) candidates against the
//! campaign tier list, opt-out registry, and send history, reserve the
//! rate-limit budget synchronously, then fan out transport attempts over a
//! small bounded worker pool.

pub mod dispatch;
pub mod eligibility;
pub mod feed;
pub mod orchestrator;
pub mod rate_limit;
pub mod run_lock;
pub mod template;
pub mod tiers;
pub mod transport;

pub use dispatch::DispatchContext;
pub use eligibility::{resolve_candidates, Candidate};
pub use feed::{HttpInvoiceFeed, StaticInvoiceFeed};
pub use orchestrator::{
    Orchestrator, OrchestratorOptions, PreviewReport, RunOutcome, RunRequest,
};
pub use rate_limit::RateBudget;
pub use run_lock::RunLock;
pub use tiers::TierList;
pub use transport::{LogTransport, MockTransport, SmtpMailer};
