// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-rate budgeting against the hourly and daily caps.
//!
//! Window boundaries are fixed-offset clock hours and calendar days, not
//! sliding windows: "50 per hour" means 50 within the current wall-clock
//! hour of the configured business timezone. The budget is computed once
//! per run from the `sent` history, then consumed synchronously before any
//! transport work begins.

use chrono::{DateTime, Duration, FixedOffset, SecondsFormat, Timelike, Utc};

use crate::eligibility::Candidate;

/// The remaining send allowance for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBudget {
    pub hourly_cap: i64,
    pub daily_cap: i64,
    pub sent_this_hour: i64,
    pub sent_today: i64,
}

impl RateBudget {
    /// Sends still permitted: the tighter of the two headrooms, floored
    /// at zero in case history already overshot a lowered cap.
    pub fn remaining(&self) -> i64 {
        let hourly = (self.hourly_cap - self.sent_this_hour).max(0);
        let daily = (self.daily_cap - self.sent_today).max(0);
        hourly.min(daily)
    }

    /// Split an ordered candidate list into (within budget, overflow),
    /// preserving order on both sides.
    pub fn split(&self, mut candidates: Vec<Candidate>) -> (Vec<Candidate>, Vec<Candidate>) {
        let allowed = self.remaining().max(0) as usize;
        if candidates.len() <= allowed {
            return (candidates, Vec::new());
        }
        let overflow = candidates.split_off(allowed);
        (candidates, overflow)
    }
}

fn business_offset(offset_minutes: i64) -> FixedOffset {
    // Validation caps |offset| at 14h, so this cannot fail.
    FixedOffset::east_opt((offset_minutes * 60) as i32)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
}

/// ISO timestamp for the start of the current business-clock hour, for
/// lexicographic comparison against stored `sent_at` values.
pub fn hour_start_utc(now: DateTime<Utc>, offset_minutes: i64) -> String {
    let local = now.with_timezone(&business_offset(offset_minutes));
    let truncated = local
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    truncated
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// ISO timestamp for the start of the current business-clock day.
pub fn day_start_utc(now: DateTime<Utc>, offset_minutes: i64) -> String {
    let offset = business_offset(offset_minutes);
    let local = now.with_timezone(&offset);
    let midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_local_timezone(offset).unwrap())
        .unwrap_or(local - Duration::hours(local.hour() as i64));
    midnight
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
