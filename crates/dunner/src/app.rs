// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared process wiring: storage, feed, transport, orchestrator.
//!
//! Every subcommand builds the same stack from config; only the transport
//! varies (`--dry-run` swaps SMTP for the logging transport).

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use dunner_config::DunnerConfig;
use dunner_core::error::DunnerError;
use dunner_core::traits::{InvoiceFeed, MailTransport};
use dunner_engine::{
    HttpInvoiceFeed, LogTransport, Orchestrator, OrchestratorOptions, SmtpMailer,
    StaticInvoiceFeed,
};
use dunner_storage::Database;

/// The assembled engine stack for one process.
pub struct App {
    pub db: Arc<Database>,
    pub orchestrator: Arc<Orchestrator>,
}

impl App {
    /// Open storage and wire the orchestrator from config.
    ///
    /// Without `feed.base_url` the engine runs against an empty snapshot:
    /// previews and gateway administration work, live sends find nothing.
    pub async fn init(config: &DunnerConfig, dry_run: bool) -> Result<Self, DunnerError> {
        let db = Arc::new(
            Database::open_with_journal(&config.storage.database_path, config.storage.wal_mode)
                .await?,
        );

        let feed: Arc<dyn InvoiceFeed> = if config.feed.base_url.is_some() {
            Arc::new(HttpInvoiceFeed::from_config(&config.feed)?)
        } else {
            warn!("feed.base_url not configured; running against an empty invoice snapshot");
            Arc::new(StaticInvoiceFeed::new(Vec::new()))
        };

        let transport: Arc<dyn MailTransport> = if dry_run {
            Arc::new(LogTransport)
        } else {
            Arc::new(SmtpMailer::from_config(&config.smtp)?)
        };

        let orchestrator = Arc::new(Orchestrator::new(
            db.clone(),
            feed,
            transport,
            OrchestratorOptions {
                utc_offset_minutes: config.engine.utc_offset_minutes as i64,
                dispatch_concurrency: config.engine.dispatch_concurrency,
                transport_timeout: Duration::from_secs(config.engine.transport_timeout_secs),
            },
        ));

        Ok(Self { db, orchestrator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dry-run wiring works without a feed or SMTP relay configured.
    #[tokio::test]
    async fn init_dry_run_without_feed_yields_empty_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DunnerConfig::default();
        config.storage.database_path = dir.path().join("dunner.db").display().to_string();

        let app = App::init(&config, true).await.unwrap();
        let report = app.orchestrator.preview(None).await.unwrap();
        assert!(report.campaigns.is_empty());
        app.db.close().await.unwrap();
    }
}
