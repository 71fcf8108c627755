// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run orchestration: the engine's single entry point for automation.
//!
//! A run is: acquire the lock, snapshot settings and the invoice feed,
//! resolve candidates, reserve the rate budget, persist `scheduled`
//! records synchronously, then fan transport attempts out over a bounded
//! worker pool. Every path through a run finalizes its audit row; the
//! lock guard drops on every exit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dunner_core::error::DunnerError;
use dunner_core::traits::{InvoiceFeed, MailTransport};
use dunner_core::types::{
    EmailMessage, OperatorEmailSettings, RunStatus, RunTrigger, SendStatus, SystemSettings,
};
use dunner_storage::queries::{campaigns, opt_outs, run_log, send_history, settings};
use dunner_storage::Database;

use crate::dispatch::DispatchContext;
use crate::eligibility::{resolve_candidates, Candidate};
use crate::rate_limit::{day_start_utc, hour_start_utc, RateBudget};
use crate::run_lock::RunLock;
use crate::template;
use crate::tiers::{TierList, TierWarning};

/// Tunables lifted from `[engine]` config at startup.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Fixed offset of the business clock, minutes east of UTC.
    pub utc_offset_minutes: i64,
    /// Concurrent transport attempts.
    pub dispatch_concurrency: usize,
    /// Per-delivery timeout.
    pub transport_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            dispatch_concurrency: 4,
            transport_timeout: Duration::from_secs(30),
        }
    }
}

/// Parameters of one triggered run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub trigger: RunTrigger,
    /// Settings of the operator who triggered the run, if any. Scheduled
    /// runs carry `None` and are never operator-test-routed.
    pub operator: Option<OperatorEmailSettings>,
    /// Force test routing regardless of stored settings.
    pub force_test: bool,
}

impl RunRequest {
    pub fn scheduled() -> Self {
        Self {
            trigger: RunTrigger::Schedule,
            operator: None,
            force_test: false,
        }
    }

    pub fn manual(operator: Option<OperatorEmailSettings>) -> Self {
        Self {
            trigger: RunTrigger::Manual,
            operator,
            force_test: false,
        }
    }
}

/// Counters for one completed run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: i64,
    /// Candidates that entered dispatch (a `scheduled` record was written).
    pub emails_scheduled: i64,
    pub emails_sent: i64,
    pub emails_failed: i64,
    /// Dispatches cancelled by the pre-send paid re-check.
    pub emails_cancelled: i64,
    /// Candidates deferred to `pending` by the rate limiter.
    pub emails_deferred: i64,
}

/// Dry-run report: what a run would do right now.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub generated_at: String,
    pub system_active: bool,
    pub test_mode: bool,
    pub budget_remaining: i64,
    pub total_eligible: i64,
    pub would_send: i64,
    pub campaigns: Vec<PreviewCampaign>,
    pub warnings: Vec<PreviewWarning>,
}

/// Per-campaign slice of a preview.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewCampaign {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub trigger_days: i64,
    pub total_eligible: i64,
    pub would_send: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewWarning {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub message: String,
}

impl From<&TierWarning> for PreviewWarning {
    fn from(w: &TierWarning) -> Self {
        Self {
            campaign_id: w.campaign_id,
            campaign_name: w.campaign_name.clone(),
            message: w.message.clone(),
        }
    }
}

enum DispatchOutcome {
    Sent,
    Failed,
    Cancelled,
}

struct PreparedSend {
    record_id: i64,
    candidate: Candidate,
    message: EmailMessage,
}

/// The automation engine. One instance lives for the process lifetime and
/// is shared between the gateway and the scheduler.
pub struct Orchestrator {
    db: Arc<Database>,
    feed: Arc<dyn InvoiceFeed>,
    transport: Arc<dyn MailTransport>,
    lock: RunLock,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(
        db: Arc<Database>,
        feed: Arc<dyn InvoiceFeed>,
        transport: Arc<dyn MailTransport>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            db,
            feed,
            transport,
            lock: RunLock::new(),
            options,
        }
    }

    fn now_iso() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    async fn current_budget(&self, system: &SystemSettings) -> Result<RateBudget, DunnerError> {
        let now = Utc::now();
        let hour_cutoff = hour_start_utc(now, self.options.utc_offset_minutes);
        let day_cutoff = day_start_utc(now, self.options.utc_offset_minutes);
        Ok(RateBudget {
            hourly_cap: system.hourly_send_cap,
            daily_cap: system.daily_send_cap,
            sent_this_hour: send_history::count_sent_since(&self.db, &hour_cutoff).await?,
            sent_today: send_history::count_sent_since(&self.db, &day_cutoff).await?,
        })
    }

    async fn gather_candidates(&self) -> Result<(Vec<Candidate>, TierList), DunnerError> {
        let invoices = self.feed.outstanding_invoices().await?;
        let tiers = TierList::build(campaigns::list_active_campaigns(&self.db).await?);

        let opt_out_map = opt_outs::list_opt_outs(&self.db)
            .await?
            .into_iter()
            .map(|e| (e.email_address.clone(), e))
            .collect();
        let history_map = send_history::sent_summaries(&self.db)
            .await?
            .into_iter()
            .map(|s| ((s.invoice_id, s.campaign_id), s))
            .collect();

        let candidates =
            resolve_candidates(&invoices, &tiers, &opt_out_map, &history_map, Utc::now());
        Ok((candidates, tiers))
    }

    /// Execute one automation run end to end.
    ///
    /// Fails fast with `RunActive` when a run is already in flight. On
    /// cancellation, undispatched `scheduled` records revert to `pending`
    /// and the run log row is finalized as failed.
    pub async fn execute(
        &self,
        request: RunRequest,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DunnerError> {
        let _guard = self.lock.try_acquire()?;

        let system = settings::get_system_settings(&self.db).await?;

        if !system.system_active {
            let run_id = run_log::start_run(&self.db, request.trigger).await?;
            run_log::finalize_run(
                &self.db,
                run_id,
                RunStatus::Completed,
                0,
                None,
                Some("system inactive; no work performed"),
            )
            .await?;
            info!(run_id, "run short-circuited: system inactive");
            return Ok(RunOutcome {
                run_id,
                ..RunOutcome::default()
            });
        }

        let run_id = run_log::start_run(&self.db, request.trigger).await?;
        info!(run_id, trigger = %request.trigger, "automation run started");

        match self.execute_inner(run_id, &request, &system, cancel).await {
            Ok(outcome) => {
                let summary = serde_json::to_string(&outcome)
                    .unwrap_or_else(|_| String::from("{}"));
                run_log::finalize_run(
                    &self.db,
                    run_id,
                    RunStatus::Completed,
                    outcome.emails_sent,
                    None,
                    Some(&summary),
                )
                .await?;
                info!(
                    run_id,
                    sent = outcome.emails_sent,
                    failed = outcome.emails_failed,
                    deferred = outcome.emails_deferred,
                    "automation run completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                if matches!(err, DunnerError::Cancelled { .. }) {
                    let reverted =
                        send_history::revert_scheduled_to_pending(&self.db).await?;
                    warn!(run_id, reverted, "run cancelled; scheduled records reverted");
                }
                run_log::finalize_run(
                    &self.db,
                    run_id,
                    RunStatus::Failed,
                    0,
                    Some(&err.to_string()),
                    None,
                )
                .await?;
                Err(err)
            }
        }
    }

    /// Body of a run. `system` is the settings snapshot taken at run
    /// entry; toggles landing mid-run take effect on the next run only.
    async fn execute_inner(
        &self,
        run_id: i64,
        request: &RunRequest,
        system: &SystemSettings,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, DunnerError> {
        let (candidates, _tiers) = self.gather_candidates().await?;
        let budget = self.current_budget(system).await?;
        let (to_send, overflow) = budget.split(candidates);

        let mut outcome = RunOutcome {
            run_id,
            ..RunOutcome::default()
        };

        // Deferrals are re-derived from the feed each run; drop the
        // previous run's leftovers so pending rows reflect this run only.
        let stale = send_history::clear_pending(&self.db).await?;
        if stale > 0 {
            info!(run_id, stale, "stale deferred records cleared");
        }

        let now = Self::now_iso();
        for deferred in &overflow {
            send_history::insert_record(
                &self.db,
                deferred.invoice.id,
                deferred.campaign.id,
                &deferred.invoice.customer_email,
                &deferred.invoice.customer_email,
                SendStatus::Pending,
                &now,
            )
            .await?;
            outcome.emails_deferred += 1;
        }
        if !overflow.is_empty() {
            info!(
                run_id,
                deferred = overflow.len(),
                remaining = budget.remaining(),
                "rate budget exhausted; overflow deferred"
            );
        }

        let context = DispatchContext {
            settings: system.clone(),
            operator: request.operator.clone(),
            force_test: request.force_test,
        };

        // Persist scheduled records synchronously before any transport
        // work so the dedup index sees the full batch.
        let mut prepared = Vec::with_capacity(to_send.len());
        for candidate in to_send {
            if cancel.is_cancelled() {
                return Err(DunnerError::Cancelled {
                    reason: "shutdown requested during scheduling".to_string(),
                });
            }

            let routed = match context.route(&candidate.invoice.customer_email) {
                Ok(routed) => routed,
                Err(err) => {
                    warn!(
                        invoice_id = candidate.invoice.id,
                        campaign_id = candidate.campaign.id,
                        error = %err,
                        "dispatch routing failed"
                    );
                    let record_id = send_history::insert_record(
                        &self.db,
                        candidate.invoice.id,
                        candidate.campaign.id,
                        &candidate.invoice.customer_email,
                        &candidate.invoice.customer_email,
                        SendStatus::Scheduled,
                        &now,
                    )
                    .await?;
                    send_history::mark_failed(&self.db, record_id, &err.to_string())
                        .await?;
                    outcome.emails_scheduled += 1;
                    outcome.emails_failed += 1;
                    continue;
                }
            };

            let record_id = match send_history::insert_record(
                &self.db,
                candidate.invoice.id,
                candidate.campaign.id,
                &routed.to,
                &candidate.invoice.customer_email,
                SendStatus::Scheduled,
                &now,
            )
            .await
            {
                Ok(id) => id,
                Err(err) => {
                    // Dedup index: a send for this pair was already
                    // attempted today. Skip without counting.
                    warn!(
                        invoice_id = candidate.invoice.id,
                        campaign_id = candidate.campaign.id,
                        error = %err,
                        "duplicate send suppressed by history index"
                    );
                    continue;
                }
            };

            let message = EmailMessage {
                to: routed.to,
                from: system.automation_sender_email.clone(),
                subject: template::render(&candidate.campaign.subject_template, &candidate.invoice),
                body: template::render(&candidate.campaign.body_template, &candidate.invoice),
            };
            prepared.push(PreparedSend {
                record_id,
                candidate,
                message,
            });
            outcome.emails_scheduled += 1;
        }

        let results = stream::iter(prepared)
            .map(|send| self.dispatch_one(send, cancel))
            .buffer_unordered(self.options.dispatch_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        for result in results {
            match result? {
                Some(DispatchOutcome::Sent) => outcome.emails_sent += 1,
                Some(DispatchOutcome::Failed) => outcome.emails_failed += 1,
                Some(DispatchOutcome::Cancelled) => outcome.emails_cancelled += 1,
                // Left scheduled by cancellation; reverted by the caller.
                None => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(DunnerError::Cancelled {
                reason: "shutdown requested during dispatch".to_string(),
            });
        }

        Ok(outcome)
    }

    /// One transport attempt: paid re-check, deliver under timeout, record
    /// the terminal state. Returns `None` when skipped by cancellation.
    async fn dispatch_one(
        &self,
        send: PreparedSend,
        cancel: &CancellationToken,
    ) -> Result<Option<DispatchOutcome>, DunnerError> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let invoice_id = send.candidate.invoice.id;

        // An invoice paid (or deleted) between snapshot and dispatch must
        // never be emailed.
        let still_due = match self.feed.invoice(invoice_id).await {
            Ok(Some(current)) => current.is_collectible(),
            Ok(None) => false,
            Err(err) => {
                warn!(invoice_id, error = %err, "pre-send re-check failed");
                send_history::mark_failed(&self.db, send.record_id, &err.to_string())
                    .await?;
                return Ok(Some(DispatchOutcome::Failed));
            }
        };
        if !still_due {
            info!(invoice_id, "invoice settled before dispatch; send cancelled");
            send_history::mark_cancelled(
                &self.db,
                send.record_id,
                "invoice paid before dispatch",
            )
            .await?;
            return Ok(Some(DispatchOutcome::Cancelled));
        }

        let delivery = timeout(
            self.options.transport_timeout,
            self.transport.deliver(&send.message),
        )
        .await;

        match delivery {
            Ok(Ok(())) => {
                send_history::mark_sent(&self.db, send.record_id, &Self::now_iso()).await?;
                Ok(Some(DispatchOutcome::Sent))
            }
            Ok(Err(err)) => {
                warn!(invoice_id, error = %err, "transport delivery failed");
                send_history::mark_failed(&self.db, send.record_id, &err.to_string())
                    .await?;
                Ok(Some(DispatchOutcome::Failed))
            }
            Err(_) => {
                let err = DunnerError::Timeout {
                    duration: self.options.transport_timeout,
                };
                warn!(invoice_id, error = %err, "transport delivery timed out");
                send_history::mark_failed(&self.db, send.record_id, &err.to_string())
                    .await?;
                Ok(Some(DispatchOutcome::Failed))
            }
        }
    }

    /// Compute what a run would do right now, with no side effects.
    ///
    /// Always available, including while the system is inactive and while
    /// a run is in flight.
    pub async fn preview(
        &self,
        operator: Option<OperatorEmailSettings>,
    ) -> Result<PreviewReport, DunnerError> {
        let system = settings::get_system_settings(&self.db).await?;
        let (candidates, tiers) = self.gather_candidates().await?;
        let budget = self.current_budget(&system).await?;
        let (would_send, _overflow) = budget.split(candidates.clone());

        let context = DispatchContext {
            settings: system.clone(),
            operator,
            force_test: false,
        };

        let mut per_campaign: Vec<PreviewCampaign> = Vec::new();
        for tier in tiers.tiers() {
            let total = candidates
                .iter()
                .filter(|c| c.campaign.id == tier.id)
                .count() as i64;
            let sendable = would_send
                .iter()
                .filter(|c| c.campaign.id == tier.id)
                .count() as i64;
            if total > 0 {
                per_campaign.push(PreviewCampaign {
                    campaign_id: tier.id,
                    campaign_name: tier.name.clone(),
                    trigger_days: tier.trigger_days,
                    total_eligible: total,
                    would_send: sendable,
                });
            }
        }

        Ok(PreviewReport {
            generated_at: Self::now_iso(),
            system_active: system.system_active,
            test_mode: context.is_test(),
            budget_remaining: budget.remaining(),
            total_eligible: candidates.len() as i64,
            would_send: would_send.len() as i64,
            campaigns: per_campaign,
            warnings: tiers.warnings().iter().map(PreviewWarning::from).collect(),
        })
    }

    /// Send one test email for a campaign to the caller's test address.
    ///
    /// Renders the templates against a sample invoice and goes through the
    /// real transport, but writes no send history and consumes no budget.
    pub async fn send_campaign_test(
        &self,
        campaign_id: i64,
        operator: Option<OperatorEmailSettings>,
    ) -> Result<String, DunnerError> {
        let campaign = campaigns::get_campaign(&self.db, campaign_id)
            .await?
            .ok_or_else(|| {
                DunnerError::Config(format!("campaign {campaign_id} does not exist"))
            })?;
        let system = settings::get_system_settings(&self.db).await?;

        let context = DispatchContext {
            settings: system.clone(),
            operator,
            force_test: true,
        };

        let sample = dunner_core::types::Invoice {
            id: 1001,
            customer_email: "customer@example.com".to_string(),
            total_amount: 1500.0,
            amount_due: 750.0,
            days_outstanding: campaign.trigger_days,
            payment_status: dunner_core::types::PaymentStatus::Partial,
        };

        let routed = context.route(&sample.customer_email)?;
        let message = EmailMessage {
            to: routed.to.clone(),
            from: system.automation_sender_email,
            subject: template::render(&campaign.subject_template, &sample),
            body: template::render(&campaign.body_template, &sample),
        };

        timeout(self.options.transport_timeout, self.transport.deliver(&message))
            .await
            .map_err(|_| DunnerError::Timeout {
                duration: self.options.transport_timeout,
            })??;

        info!(campaign_id, to = routed.to.as_str(), "campaign test email sent");
        Ok(routed.to)
    }
}
