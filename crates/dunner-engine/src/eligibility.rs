// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Eligibility resolution: the pure core of the engine.
//!
//! Maps (invoice snapshot, tier list, opt-outs, send history, now) to an
//! ordered candidate list. No I/O happens here; the orchestrator gathers
//! the inputs and persists the outputs, which keeps every rule in this
//! module unit-testable without a database.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use dunner_core::types::{Campaign, Invoice, OptOutEntry, SendFrequency};
use dunner_storage::SentSummary;

use crate::tiers::TierList;

/// One (invoice, campaign) pair due for a send.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub invoice: Invoice,
    pub campaign: Campaign,
}

impl Candidate {
    /// Priority score: more-overdue tiers dispatch first.
    pub fn priority(&self) -> i64 {
        self.campaign.trigger_days
    }
}

/// Resolve the ordered candidate list for one run.
///
/// Rules, in order:
/// 1. Only unpaid/partial invoices participate; each matches at most the
///    single most urgent tier (largest `trigger_days` at or below its age).
/// 2. Send history gates recurrence: `once` campaigns never repeat after a
///    sent record; `recurring` campaigns repeat only once
///    `recurring_interval_days` have elapsed since the last sent record;
///    `max_reminders` caps sent records per pair. Failed attempts consume
///    nothing.
/// 3. Opt-outs suppress by scope (`all` / `reminders` / `collections`).
///
/// Output is sorted by descending `trigger_days` then ascending invoice id
/// so rate-limit truncation is reproducible.
pub fn resolve_candidates(
    invoices: &[Invoice],
    tiers: &TierList,
    opt_outs: &HashMap<String, OptOutEntry>,
    history: &HashMap<(i64, i64), SentSummary>,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for invoice in invoices {
        if !invoice.is_collectible() {
            continue;
        }

        let Some(campaign) = tiers.match_tier(invoice.days_outstanding) else {
            continue;
        };

        if !history_permits(campaign, history.get(&(invoice.id, campaign.id)), now) {
            continue;
        }

        if let Some(entry) = opt_outs.get(&invoice.customer_email) {
            if entry.suppresses(campaign.campaign_type) {
                debug!(
                    invoice_id = invoice.id,
                    email = invoice.customer_email.as_str(),
                    "suppressed by opt-out"
                );
                continue;
            }
        }

        candidates.push(Candidate {
            invoice: invoice.clone(),
            campaign: campaign.clone(),
        });
    }

    candidates.sort_by_key(|c| (std::cmp::Reverse(c.priority()), c.invoice.id));
    candidates
}

/// Whether send history permits another send for this pair.
fn history_permits(
    campaign: &Campaign,
    summary: Option<&SentSummary>,
    now: DateTime<Utc>,
) -> bool {
    let Some(summary) = summary else {
        // Never sent: always permitted.
        return true;
    };

    if let Some(max) = campaign.max_reminders {
        if summary.sent_count >= max {
            return false;
        }
    }

    match campaign.send_frequency {
        SendFrequency::Once => false,
        SendFrequency::Recurring => {
            // TierList::build guarantees the interval is present.
            let Some(interval) = campaign.recurring_interval_days else {
                return false;
            };
            match DateTime::parse_from_rfc3339(&summary.last_sent_at) {
                Ok(last_sent) => {
                    now.signed_duration_since(last_sent.with_timezone(&Utc))
                        >= Duration::days(interval)
                }
                Err(_) => {
                    // Unparseable history is treated as too recent: never
                    // risk a duplicate customer email on bad data.
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dunner_core::types::{CampaignType, PaymentStatus};

    fn invoice(id: i64, days: i64) -> Invoice {
        Invoice {
            id,
            customer_email: format!("customer{id}@example.com"),
            total_amount: 500.0,
            amount_due: 500.0,
            days_outstanding: days,
            payment_status: PaymentStatus::Unpaid,
        }
    }

    fn campaign(id: i64, trigger_days: i64) -> Campaign {
        Campaign {
            id,
            name: format!("tier-{trigger_days}"),
            campaign_type: CampaignType::PaymentReminder,
            trigger_days,
            send_frequency: SendFrequency::Once,
            recurring_interval_days: None,
            max_reminders: None,
            is_active: true,
            subject_template: String::new(),
            body_template: String::new(),
        }
    }

    fn recurring(id: i64, trigger_days: i64, interval: i64) -> Campaign {
        Campaign {
            send_frequency: SendFrequency::Recurring,
            recurring_interval_days: Some(interval),
            ..campaign(id, trigger_days)
        }
    }

    fn summary(invoice_id: i64, campaign_id: i64, last_sent: &str, count: i64) -> SentSummary {
        SentSummary {
            invoice_id,
            campaign_id,
            last_sent_at: last_sent.to_string(),
            sent_count: count,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn standard_tiers() -> TierList {
        TierList::build(vec![campaign(1, 31), campaign(2, 61), campaign(3, 91)])
    }

    #[test]
    fn invoice_resolves_to_single_most_urgent_tier() {
        let candidates = resolve_candidates(
            &[invoice(10, 95)],
            &standard_tiers(),
            &HashMap::new(),
            &HashMap::new(),
            now(),
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].campaign.trigger_days, 91);
    }

    #[test]
    fn young_and_paid_invoices_are_skipped() {
        let mut paid = invoice(11, 70);
        paid.payment_status = PaymentStatus::Paid;

        let candidates = resolve_candidates(
            &[invoice(10, 20), paid],
            &standard_tiers(),
            &HashMap::new(),
            &HashMap::new(),
            now(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn once_campaign_never_repeats() {
        let mut history = HashMap::new();
        history.insert((10, 2), summary(10, 2, "2025-12-01T09:00:00.000Z", 1));

        let candidates = resolve_candidates(
            &[invoice(10, 70)],
            &standard_tiers(),
            &HashMap::new(),
            &history,
            now(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn recurring_respects_interval_window() {
        let tiers = TierList::build(vec![recurring(5, 31, 7)]);
        let mut history = HashMap::new();
        // Sent 3 days ago: inside the window.
        history.insert((10, 5), summary(10, 5, "2026-03-07T09:00:00.000Z", 1));
        let blocked = resolve_candidates(
            &[invoice(10, 45)],
            &tiers,
            &HashMap::new(),
            &history,
            now(),
        );
        assert!(blocked.is_empty());

        // Sent 8 days ago: window elapsed, exactly one candidate.
        history.insert((10, 5), summary(10, 5, "2026-03-02T09:00:00.000Z", 1));
        let due = resolve_candidates(
            &[invoice(10, 45)],
            &tiers,
            &HashMap::new(),
            &history,
            now(),
        );
        assert_eq!(due.len(), 1);
    }

    #[test]
    fn max_reminders_caps_sent_count() {
        let mut capped = recurring(5, 31, 7);
        capped.max_reminders = Some(3);
        let tiers = TierList::build(vec![capped]);

        let mut history = HashMap::new();
        history.insert((10, 5), summary(10, 5, "2026-02-01T09:00:00.000Z", 3));

        let candidates = resolve_candidates(
            &[invoice(10, 45)],
            &tiers,
            &HashMap::new(),
            &history,
            now(),
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn opt_out_all_is_absolute_across_types() {
        let tiers = TierList::build(vec![
            campaign(1, 31),
            Campaign {
                campaign_type: CampaignType::FinalNotice,
                ..campaign(2, 91)
            },
        ]);
        let inv = invoice(10, 95);
        let mut opt_outs = HashMap::new();
        opt_outs.insert(
            inv.customer_email.clone(),
            OptOutEntry {
                email_address: inv.customer_email.clone(),
                opted_out_all: true,
                opted_out_reminders: false,
                opted_out_collections: false,
                reason: None,
                opt_out_date: "2026-01-01T00:00:00.000Z".to_string(),
            },
        );

        let candidates =
            resolve_candidates(&[inv], &tiers, &opt_outs, &HashMap::new(), now());
        assert!(candidates.is_empty());
    }

    #[test]
    fn reminders_opt_out_leaves_collections_untouched() {
        let tiers = TierList::build(vec![Campaign {
            campaign_type: CampaignType::CollectionsNotice,
            ..campaign(2, 61)
        }]);
        let inv = invoice(10, 70);
        let mut opt_outs = HashMap::new();
        opt_outs.insert(
            inv.customer_email.clone(),
            OptOutEntry {
                email_address: inv.customer_email.clone(),
                opted_out_all: false,
                opted_out_reminders: true,
                opted_out_collections: false,
                reason: None,
                opt_out_date: "2026-01-01T00:00:00.000Z".to_string(),
            },
        );

        let candidates =
            resolve_candidates(&[inv], &tiers, &opt_outs, &HashMap::new(), now());
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn ordering_is_descending_urgency_then_ascending_invoice_id() {
        let candidates = resolve_candidates(
            &[invoice(7, 45), invoice(3, 95), invoice(5, 95), invoice(1, 70)],
            &standard_tiers(),
            &HashMap::new(),
            &HashMap::new(),
            now(),
        );

        let order: Vec<(i64, i64)> = candidates
            .iter()
            .map(|c| (c.campaign.trigger_days, c.invoice.id))
            .collect();
        assert_eq!(order, vec![(91, 3), (91, 5), (61, 1), (31, 7)]);
    }

    #[test]
    fn unparseable_history_blocks_rather_than_duplicates() {
        let tiers = TierList::build(vec![recurring(5, 31, 7)]);
        let mut history = HashMap::new();
        history.insert((10, 5), summary(10, 5, "not-a-date", 1));

        let candidates = resolve_candidates(
            &[invoice(10, 45)],
            &tiers,
            &HashMap::new(),
            &history,
            now(),
        );
        assert!(candidates.is_empty());
    }
}
