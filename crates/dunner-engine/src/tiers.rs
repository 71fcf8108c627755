// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign tier list: validated, sorted, built once per run.
//!
//! Tier selection used to be an ad hoc per-invoice comparison in the
//! original system; here the catalog is validated up front and malformed
//! campaigns are skipped with a warning so one broken campaign never
//! blocks the others.

use tracing::warn;

use dunner_core::types::{Campaign, SendFrequency};

/// A per-campaign configuration problem surfaced to preview as a
/// diagnostic rather than a hard failure.
#[derive(Debug, Clone, PartialEq)]
pub struct TierWarning {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub message: String,
}

/// The validated campaign tier list for one run.
///
/// Tiers are held sorted by ascending `trigger_days`; matching picks the
/// last tier whose threshold the invoice has passed, which is exactly the
/// largest-`trigger_days` precedence rule.
#[derive(Debug, Clone, Default)]
pub struct TierList {
    tiers: Vec<Campaign>,
    warnings: Vec<TierWarning>,
}

impl TierList {
    /// Build the tier list from the active campaign catalog.
    ///
    /// Malformed campaigns are dropped and recorded as warnings:
    /// a `recurring` campaign without `recurring_interval_days`, a
    /// non-positive `trigger_days`, or a non-positive `max_reminders`.
    pub fn build(campaigns: Vec<Campaign>) -> Self {
        let mut tiers = Vec::with_capacity(campaigns.len());
        let mut warnings = Vec::new();

        for campaign in campaigns {
            if let Some(message) = validate_campaign(&campaign) {
                warn!(
                    campaign_id = campaign.id,
                    campaign = campaign.name.as_str(),
                    message = message.as_str(),
                    "skipping malformed campaign"
                );
                warnings.push(TierWarning {
                    campaign_id: campaign.id,
                    campaign_name: campaign.name.clone(),
                    message,
                });
                continue;
            }
            tiers.push(campaign);
        }

        // Ascending trigger_days; equal thresholds keep the higher id last
        // so duplicate-tier selection is deterministic.
        tiers.sort_by_key(|c| (c.trigger_days, c.id));

        Self { tiers, warnings }
    }

    /// Select the tier matching an invoice age: among all tiers with
    /// `trigger_days <= days_outstanding`, the one with the largest
    /// `trigger_days` wins. Returns `None` below every threshold.
    pub fn match_tier(&self, days_outstanding: i64) -> Option<&Campaign> {
        self.tiers
            .iter()
            .rev()
            .find(|c| c.trigger_days <= days_outstanding)
    }

    /// All valid tiers in ascending threshold order.
    pub fn tiers(&self) -> &[Campaign] {
        &self.tiers
    }

    /// Configuration warnings collected during build.
    pub fn warnings(&self) -> &[TierWarning] {
        &self.warnings
    }
}

fn validate_campaign(campaign: &Campaign) -> Option<String> {
    if campaign.trigger_days <= 0 {
        return Some(format!(
            "trigger_days must be positive, got {}",
            campaign.trigger_days
        ));
    }
    if campaign.send_frequency == SendFrequency::Recurring {
        match campaign.recurring_interval_days {
            None => {
                return Some(
                    "recurring campaign is missing recurring_interval_days".to_string(),
                );
            }
            Some(interval) if interval <= 0 => {
                return Some(format!(
                    "recurring_interval_days must be positive, got {interval}"
                ));
            }
            Some(_) => {}
        }
    }
    if let Some(max) = campaign.max_reminders {
        if max <= 0 {
            return Some(format!("max_reminders must be positive, got {max}"));
        }
    }
    None
}
