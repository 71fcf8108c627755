// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation run log operations: the append-only audit trail.
//!
//! A row is created in `running` state before any side effect, so a crash
//! mid-run is observable and distinguishable from "never ran".

use rusqlite::params;

use dunner_core::types::{RunStatus, RunTrigger};
use dunner_core::DunnerError;

use crate::database::Database;
use crate::models::AutomationRunLog;

fn row_to_log(row: &rusqlite::Row<'_>) -> Result<AutomationRunLog, rusqlite::Error> {
    let status: String = row.get(3)?;
    let triggered_by: String = row.get(4)?;
    Ok(AutomationRunLog {
        id: row.get(0)?,
        run_started_at: row.get(1)?,
        run_completed_at: row.get(2)?,
        status: status.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        triggered_by: triggered_by.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        emails_sent: row.get(5)?,
        error_message: row.get(6)?,
        summary: row.get(7)?,
    })
}

/// Create a run log row in `running` state. Returns its id.
pub async fn start_run(db: &Database, triggered_by: RunTrigger) -> Result<i64, DunnerError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO automation_run_log (triggered_by) VALUES (?1)",
                params![triggered_by.to_string()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Finalize a run log row with its terminal status and counters.
pub async fn finalize_run(
    db: &Database,
    id: i64,
    status: RunStatus,
    emails_sent: i64,
    error_message: Option<&str>,
    summary: Option<&str>,
) -> Result<(), DunnerError> {
    let error_message = error_message.map(str::to_string);
    let summary = summary.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE automation_run_log SET
                 status = ?1,
                 emails_sent = ?2,
                 error_message = ?3,
                 summary = ?4,
                 run_completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?5",
                params![status.to_string(), emails_sent, error_message, summary, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one run log row.
pub async fn get_run(db: &Database, id: i64) -> Result<Option<AutomationRunLog>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, run_started_at, run_completed_at, status, triggered_by,
                        emails_sent, error_message, summary
                 FROM automation_run_log WHERE id = ?1",
            )?;
            match stmt.query_row(params![id], row_to_log) {
                Ok(l) => Ok(Some(l)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the most recent runs, newest first.
pub async fn list_runs(db: &Database, limit: i64) -> Result<Vec<AutomationRunLog>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, run_started_at, run_completed_at, status, triggered_by,
                        emails_sent, error_message, summary
                 FROM automation_run_log ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_log)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
