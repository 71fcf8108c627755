// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send history operations: the dedup and recurrence backbone.
//!
//! The daily-dedup unique index on (invoice_id, campaign_id,
//! date(scheduled_for)) over scheduled/sent rows enforces the
//! one-attempt-per-recurrence-window invariant at the storage layer, on
//! top of the resolver's own checks.

use rusqlite::params;

use dunner_core::types::SendStatus;
use dunner_core::DunnerError;

use crate::database::Database;
use crate::models::{SendRecord, SentSummary};

const RECORD_COLUMNS: &str = "id, invoice_id, campaign_id, recipient_email, intended_recipient,
     status, scheduled_for, sent_at, error_message, created_at";

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<SendRecord, rusqlite::Error> {
    let status: String = row.get(5)?;
    Ok(SendRecord {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        campaign_id: row.get(2)?,
        recipient_email: row.get(3)?,
        intended_recipient: row.get(4)?,
        status: status.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        scheduled_for: row.get(6)?,
        sent_at: row.get(7)?,
        error_message: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a new send record in `pending` or `scheduled` state.
///
/// Returns the auto-generated id. Inserting a second `scheduled` record for
/// the same (invoice, campaign, day) violates the dedup index and surfaces
/// as a storage error.
pub async fn insert_record(
    db: &Database,
    invoice_id: i64,
    campaign_id: i64,
    recipient_email: &str,
    intended_recipient: &str,
    status: SendStatus,
    scheduled_for: &str,
) -> Result<i64, DunnerError> {
    debug_assert!(matches!(status, SendStatus::Pending | SendStatus::Scheduled));
    let recipient = recipient_email.to_string();
    let intended = intended_recipient.to_string();
    let scheduled = scheduled_for.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO send_history
                 (invoice_id, campaign_id, recipient_email, intended_recipient,
                  status, scheduled_for)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    invoice_id,
                    campaign_id,
                    recipient,
                    intended,
                    status.to_string(),
                    scheduled,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transition a record to `sent` with the given timestamp.
pub async fn mark_sent(db: &Database, id: i64, sent_at: &str) -> Result<(), DunnerError> {
    let sent_at = sent_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE send_history SET status = 'sent', sent_at = ?1 WHERE id = ?2",
                params![sent_at, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transition a record to `failed` with the transport error message.
pub async fn mark_failed(db: &Database, id: i64, error: &str) -> Result<(), DunnerError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE send_history SET status = 'failed', error_message = ?1 WHERE id = ?2",
                params![error, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transition a record to `cancelled` (opt-out raced the run, or the
/// invoice was paid between snapshot and dispatch).
pub async fn mark_cancelled(db: &Database, id: i64, reason: &str) -> Result<(), DunnerError> {
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE send_history SET status = 'cancelled', error_message = ?1 WHERE id = ?2",
                params![reason, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Revert all `scheduled` records to `pending`.
///
/// Used on run cancellation: records already `sent` stand, undispatched
/// ones return to the pool for the next run's re-evaluation.
pub async fn revert_scheduled_to_pending(db: &Database) -> Result<usize, DunnerError> {
    db.connection()
        .call(|conn| {
            let n = conn.execute(
                "UPDATE send_history SET status = 'pending' WHERE status = 'scheduled'",
                [],
            )?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Per-pair aggregates over `sent` records for the eligibility resolver.
///
/// Only `sent` records appear: failed attempts do not consume reminder
/// slots and never block recurrence.
pub async fn sent_summaries(db: &Database) -> Result<Vec<SentSummary>, DunnerError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT invoice_id, campaign_id, MAX(sent_at), COUNT(*)
                 FROM send_history
                 WHERE status = 'sent'
                 GROUP BY invoice_id, campaign_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(SentSummary {
                    invoice_id: row.get(0)?,
                    campaign_id: row.get(1)?,
                    last_sent_at: row.get(2)?,
                    sent_count: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count records sent at or after the given ISO 8601 UTC cutoff.
///
/// `sent_at` is stored as a UTC ISO string, so lexicographic comparison is
/// chronological. Used by the rate limiter for hour/day budgets.
pub async fn count_sent_since(db: &Database, cutoff: &str) -> Result<i64, DunnerError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM send_history WHERE status = 'sent' AND sent_at >= ?1",
                params![cutoff],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one record by id.
pub async fn get_record(db: &Database, id: i64) -> Result<Option<SendRecord>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM send_history WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_record) {
                Ok(r) => Ok(Some(r)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List records in a given status, newest first.
pub async fn list_by_status(
    db: &Database,
    status: SendStatus,
) -> Result<Vec<SendRecord>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM send_history
                 WHERE status = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map(params![status.to_string()], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete all deferred `pending` rows.
///
/// Deferrals are re-derived from the live feed on every run, so each run
/// clears the previous run's leftovers before writing its own. Without
/// this, a day spent at the cap re-inserts a pending row per candidate on
/// every trigger.
pub async fn clear_pending(db: &Database) -> Result<usize, DunnerError> {
    db.connection()
        .call(|conn| {
            let n = conn.execute("DELETE FROM send_history WHERE status = 'pending'", [])?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the most recent records regardless of status.
pub async fn list_recent(db: &Database, limit: i64) -> Result<Vec<SendRecord>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM send_history ORDER BY id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count of records per status, for the stats projection.
pub async fn status_counts(db: &Database) -> Result<Vec<(String, i64)>, DunnerError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM send_history GROUP BY status ORDER BY status",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::campaigns::{create_campaign, tests::sample_campaign};
    use tempfile::tempdir;

    async fn setup() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        let campaign_id = create_campaign(&db, &sample_campaign(31)).await.unwrap();
        (db, campaign_id, dir)
    }

    #[tokio::test]
    async fn scheduled_to_sent_lifecycle() {
        let (db, campaign_id, _dir) = setup().await;

        let id = insert_record(
            &db,
            100,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();

        mark_sent(&db, id, "2026-03-02T09:00:01.000Z").await.unwrap();

        let rec = get_record(&db, id).await.unwrap().unwrap();
        assert_eq!(rec.status, SendStatus::Sent);
        assert_eq!(rec.sent_at.as_deref(), Some("2026-03-02T09:00:01.000Z"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_scheduled_same_day_rejected() {
        let (db, campaign_id, _dir) = setup().await;

        insert_record(
            &db,
            100,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();

        // Same pair, same calendar day: the dedup index must refuse it.
        let dup = insert_record(
            &db,
            100,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T13:00:00.000Z",
        )
        .await;
        assert!(dup.is_err(), "same-day duplicate should violate dedup index");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn pending_records_do_not_hit_dedup_index() {
        let (db, campaign_id, _dir) = setup().await;

        for _ in 0..2 {
            insert_record(
                &db,
                100,
                campaign_id,
                "c@d.com",
                "c@d.com",
                SendStatus::Pending,
                "2026-03-02T09:00:00.000Z",
            )
            .await
            .unwrap();
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sent_summaries_exclude_failed_attempts() {
        let (db, campaign_id, _dir) = setup().await;

        let a = insert_record(
            &db,
            100,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-01T09:00:00.000Z",
        )
        .await
        .unwrap();
        mark_sent(&db, a, "2026-03-01T09:00:01.000Z").await.unwrap();

        let b = insert_record(
            &db,
            100,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();
        mark_failed(&db, b, "mail provider 550").await.unwrap();

        let summaries = sent_summaries(&db).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].sent_count, 1);
        assert_eq!(summaries[0].last_sent_at, "2026-03-01T09:00:01.000Z");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn count_sent_since_uses_cutoff() {
        let (db, campaign_id, _dir) = setup().await;

        for (invoice, day) in [(1, "01"), (2, "02"), (3, "03")] {
            let id = insert_record(
                &db,
                invoice,
                campaign_id,
                "c@d.com",
                "c@d.com",
                SendStatus::Scheduled,
                &format!("2026-03-{day}T09:00:00.000Z"),
            )
            .await
            .unwrap();
            mark_sent(&db, id, &format!("2026-03-{day}T09:00:01.000Z"))
                .await
                .unwrap();
        }

        let since_second = count_sent_since(&db, "2026-03-02T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(since_second, 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn revert_scheduled_leaves_sent_standing() {
        let (db, campaign_id, _dir) = setup().await;

        let sent = insert_record(
            &db,
            1,
            campaign_id,
            "a@b.com",
            "a@b.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();
        mark_sent(&db, sent, "2026-03-02T09:00:01.000Z").await.unwrap();

        let scheduled = insert_record(
            &db,
            2,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();

        let reverted = revert_scheduled_to_pending(&db).await.unwrap();
        assert_eq!(reverted, 1);

        assert_eq!(
            get_record(&db, sent).await.unwrap().unwrap().status,
            SendStatus::Sent
        );
        assert_eq!(
            get_record(&db, scheduled).await.unwrap().unwrap().status,
            SendStatus::Pending
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_by_status_filters_newest_first() {
        let (db, campaign_id, _dir) = setup().await;

        for invoice in [1, 2] {
            insert_record(
                &db,
                invoice,
                campaign_id,
                "c@d.com",
                "c@d.com",
                SendStatus::Pending,
                "2026-03-02T09:00:00.000Z",
            )
            .await
            .unwrap();
        }
        insert_record(
            &db,
            3,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();

        let pending = list_by_status(&db, SendStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].invoice_id, 2);
        assert_eq!(pending[1].invoice_id, 1);
        assert!(list_by_status(&db, SendStatus::Failed).await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn clear_pending_leaves_other_statuses() {
        let (db, campaign_id, _dir) = setup().await;

        for invoice in [1, 2] {
            insert_record(
                &db,
                invoice,
                campaign_id,
                "c@d.com",
                "c@d.com",
                SendStatus::Pending,
                "2026-03-02T09:00:00.000Z",
            )
            .await
            .unwrap();
        }
        let kept = insert_record(
            &db,
            3,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();

        assert_eq!(clear_pending(&db).await.unwrap(), 2);
        assert!(list_by_status(&db, SendStatus::Pending).await.unwrap().is_empty());
        assert_eq!(
            get_record(&db, kept).await.unwrap().unwrap().status,
            SendStatus::Scheduled
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_counts_groups_by_status() {
        let (db, campaign_id, _dir) = setup().await;

        let a = insert_record(
            &db,
            1,
            campaign_id,
            "a@b.com",
            "a@b.com",
            SendStatus::Scheduled,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();
        mark_cancelled(&db, a, "invoice paid before dispatch")
            .await
            .unwrap();
        insert_record(
            &db,
            2,
            campaign_id,
            "c@d.com",
            "c@d.com",
            SendStatus::Pending,
            "2026-03-02T09:00:00.000Z",
        )
        .await
        .unwrap();

        let counts = status_counts(&db).await.unwrap();
        assert!(counts.contains(&("cancelled".to_string(), 1)));
        assert!(counts.contains(&("pending".to_string(), 1)));

        db.close().await.unwrap();
    }
}
