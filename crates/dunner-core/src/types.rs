// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model shared across the Dunner crates.
//!
//! Timestamps are ISO 8601 strings throughout (the SQLite layer stores
//! `strftime('%Y-%m-%dT%H:%M:%fZ')` values); the engine parses them with
//! chrono only where date arithmetic is required.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Payment state of an invoice as reported by the external feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Unpaid,
}

/// An outstanding invoice, materialized fresh each run from the feed.
///
/// Read-only to the engine; never mutated or persisted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    /// Billing-contact email address.
    pub customer_email: String,
    pub total_amount: f64,
    pub amount_due: f64,
    /// Recomputed by the feed for every snapshot.
    pub days_outstanding: i64,
    pub payment_status: PaymentStatus,
}

impl Invoice {
    /// True when the invoice still owes money and may receive reminders.
    pub fn is_collectible(&self) -> bool {
        matches!(
            self.payment_status,
            PaymentStatus::Unpaid | PaymentStatus::Partial
        )
    }
}

/// Category of a campaign, used for opt-out scoping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    PaymentReminder,
    CollectionsNotice,
    FinalNotice,
}

/// Cadence of a campaign.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SendFrequency {
    Once,
    Recurring,
}

/// A configured tier of overdue-invoice notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub campaign_type: CampaignType,
    /// Minimum invoice age in days to qualify for this tier.
    pub trigger_days: i64,
    pub send_frequency: SendFrequency,
    /// Required iff `send_frequency` is `Recurring`.
    pub recurring_interval_days: Option<i64>,
    /// Cap on sends per invoice for this campaign. `None` means unlimited.
    pub max_reminders: Option<i64>,
    pub is_active: bool,
    pub subject_template: String,
    pub body_template: String,
}

/// Lifecycle state of a send record.
///
/// Terminal states are `Sent`, `Failed` (after a transport attempt), and
/// `Cancelled` (superseded by opt-out or the invoice being paid before
/// dispatch). `Pending` marks candidates deferred by the rate limiter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Pending,
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}

/// Durable record of one scheduled/attempted/sent email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: i64,
    pub invoice_id: i64,
    pub campaign_id: i64,
    /// Effective address the email was (or would be) delivered to.
    pub recipient_email: String,
    /// The customer address that would have received the email in live mode.
    /// Recorded even when test-mode routing rewrote the recipient.
    pub intended_recipient: String,
    pub status: SendStatus,
    pub scheduled_for: String,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// A customer-level suppression preference.
///
/// Removal is a hard delete; there is no tombstoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptOutEntry {
    pub email_address: String,
    pub opted_out_all: bool,
    pub opted_out_reminders: bool,
    pub opted_out_collections: bool,
    pub reason: Option<String>,
    pub opt_out_date: String,
}

impl OptOutEntry {
    /// Whether this entry suppresses emails of the given campaign type.
    pub fn suppresses(&self, campaign_type: CampaignType) -> bool {
        if self.opted_out_all {
            return true;
        }
        match campaign_type {
            CampaignType::PaymentReminder => self.opted_out_reminders,
            CampaignType::CollectionsNotice | CampaignType::FinalNotice => {
                self.opted_out_collections
            }
        }
    }
}

/// Status of one orchestrator invocation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// What initiated a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Schedule,
    Manual,
    Test,
}

/// One row of the append-only automation audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRunLog {
    pub id: i64,
    pub run_started_at: String,
    pub run_completed_at: Option<String>,
    pub status: RunStatus,
    pub triggered_by: RunTrigger,
    pub emails_sent: i64,
    pub error_message: Option<String>,
    pub summary: Option<String>,
}

/// Process-wide automation settings, persisted as a single row.
///
/// Mutated only through the gateway's administrative routes; the
/// orchestrator snapshots them once at run entry and never re-reads
/// mid-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    /// System-wide kill switch. When false, runs short-circuit entirely.
    pub system_active: bool,
    /// When true, every recipient is rewritten to `global_test_email`.
    pub global_test_mode: bool,
    pub global_test_email: Option<String>,
    /// From-address for all automation email.
    pub automation_sender_email: String,
    pub hourly_send_cap: i64,
    pub daily_send_cap: i64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            system_active: true,
            global_test_mode: false,
            global_test_email: None,
            automation_sender_email: "collections@example.com".to_string(),
            hourly_send_cap: 50,
            daily_send_cap: 500,
        }
    }
}

/// Per-operator email routing preferences.
///
/// Backs the middle level of the dispatch override chain: global test mode
/// beats these, and these beat live delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorEmailSettings {
    pub operator_id: String,
    pub test_mode_enabled: bool,
    pub test_recipient: Option<String>,
    pub sender_name: Option<String>,
}

/// A rendered email ready for transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}
