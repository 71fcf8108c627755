// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dunner serve` command implementation.
//!
//! Runs the gateway HTTP API and the cron scheduler side by side against
//! one shared orchestrator. Scheduled and gateway-triggered runs contend
//! on the same run lock; the loser gets `RunActive` and is dropped, not
//! queued. SIGINT/SIGTERM cancel in-flight runs gracefully.

use chrono::Utc;
use croner::Cron;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use dunner_config::DunnerConfig;
use dunner_core::error::DunnerError;
use dunner_engine::{Orchestrator, RunRequest};
use dunner_gateway::{AuthConfig, GatewayState, ServerConfig};

use crate::app::App;

/// Runs the `dunner serve` command until shutdown.
pub async fn run_serve(config: DunnerConfig) -> Result<(), DunnerError> {
    info!("starting dunner serve");

    let app = App::init(&config, false).await?;
    let cancel = CancellationToken::new();

    tokio::spawn(shutdown_signal(cancel.clone()));

    let scheduler = if config.engine.schedule_enabled {
        let cron = parse_schedule(&config.engine.schedule)?;
        let orchestrator = app.orchestrator.clone();
        let cancel = cancel.clone();
        Some(tokio::spawn(async move {
            schedule_loop(cron, orchestrator, cancel).await;
        }))
    } else {
        info!("scheduler disabled; runs must be triggered manually");
        None
    };

    if config.gateway.enabled {
        let server_config = ServerConfig {
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            bearer_token: config.gateway.bearer_token.clone(),
        };
        if server_config.bearer_token.is_none() {
            warn!("gateway.bearer_token not set; all API requests will be rejected");
        }
        let state = GatewayState {
            db: app.db.clone(),
            orchestrator: app.orchestrator.clone(),
            auth: AuthConfig {
                bearer_token: server_config.bearer_token.clone(),
            },
            shutdown: cancel.clone(),
            start_time: std::time::Instant::now(),
        };
        dunner_gateway::start_server(&server_config, state).await?;
    } else {
        info!("gateway disabled; waiting for shutdown signal");
        cancel.cancelled().await;
    }

    if let Some(handle) = scheduler {
        cancel.cancel();
        let _ = handle.await;
    }

    app.db.close().await?;
    info!("dunner serve shutdown complete");
    Ok(())
}

fn parse_schedule(schedule: &str) -> Result<Cron, DunnerError> {
    schedule
        .parse::<Cron>()
        .map_err(|e| DunnerError::Config(format!("invalid engine.schedule '{schedule}': {e}")))
}

/// Fires a scheduled run at each cron occurrence until cancelled.
///
/// The orchestrator is idempotent under re-entry (send-history dedup plus
/// the hourly count), so an occurrence landing while the previous run is
/// still active is simply dropped via `RunActive`.
async fn schedule_loop(
    cron: Cron,
    orchestrator: std::sync::Arc<Orchestrator>,
    cancel: CancellationToken,
) {
    loop {
        let next = match cron.find_next_occurrence(&Utc::now(), false) {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "no next schedule occurrence; scheduler stopping");
                return;
            }
        };
        let wait = (next - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        info!(next = %next, "next scheduled run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => {
                info!("scheduler shutting down");
                return;
            }
        }

        match orchestrator.execute(RunRequest::scheduled(), &cancel).await {
            Ok(outcome) => info!(
                run_id = outcome.run_id,
                sent = outcome.emails_sent,
                failed = outcome.emails_failed,
                deferred = outcome.emails_deferred,
                "scheduled run finished"
            ),
            Err(DunnerError::RunActive) => {
                warn!("scheduled run skipped: a run is already active")
            }
            Err(DunnerError::Cancelled { reason }) => {
                info!(reason = reason.as_str(), "scheduled run cancelled");
                return;
            }
            Err(e) => error!(error = %e, "scheduled run failed"),
        }
    }
}

/// Resolves on SIGINT or SIGTERM and trips the cancellation token.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_parses() {
        let config = dunner_config::EngineConfig::default();
        let cron = parse_schedule(&config.schedule).unwrap();
        // Business-day cadence: next occurrence always exists.
        assert!(cron.find_next_occurrence(&Utc::now(), false).is_ok());
    }

    #[test]
    fn malformed_schedule_is_a_config_error() {
        assert!(matches!(
            parse_schedule("not a cron line"),
            Err(DunnerError::Config(_))
        ));
    }
}
