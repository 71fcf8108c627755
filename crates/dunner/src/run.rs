// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dunner run` and `dunner preview` command implementations.

use tokio_util::sync::CancellationToken;
use tracing::info;

use dunner_config::DunnerConfig;
use dunner_core::error::DunnerError;
use dunner_core::types::RunTrigger;
use dunner_engine::RunRequest;

use crate::app::App;

/// Runs one manual automation run and prints the counters.
pub async fn run_once(config: DunnerConfig, test: bool, dry_run: bool) -> Result<(), DunnerError> {
    let app = App::init(&config, dry_run).await?;
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let request = RunRequest {
        trigger: if test {
            RunTrigger::Test
        } else {
            RunTrigger::Manual
        },
        operator: None,
        force_test: test,
    };

    let outcome = app.orchestrator.execute(request, &cancel).await?;
    info!(run_id = outcome.run_id, "manual run finished");
    println!(
        "run {}: scheduled={} sent={} failed={} cancelled={} deferred={}",
        outcome.run_id,
        outcome.emails_scheduled,
        outcome.emails_sent,
        outcome.emails_failed,
        outcome.emails_cancelled,
        outcome.emails_deferred,
    );

    app.db.close().await?;
    Ok(())
}

/// Computes and prints the dry-run candidate report as JSON.
pub async fn run_preview(config: DunnerConfig) -> Result<(), DunnerError> {
    let app = App::init(&config, true).await?;
    let report = app.orchestrator.preview(None).await?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| DunnerError::Internal(format!("failed to render preview: {e}")))?;
    println!("{rendered}");
    app.db.close().await?;
    Ok(())
}
