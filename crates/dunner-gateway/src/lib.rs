// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST API surface for the Dunner collection engine.
//!
//! Exposes run triggering, dry-run preview, system toggles, campaign
//! management, opt-out management, and read-only reporting projections
//! over HTTP. All automation state lives in storage; the gateway holds no
//! state of its own beyond the shared orchestrator handle.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
