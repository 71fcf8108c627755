// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opt-out registry operations.
//!
//! Removal is a hard delete. There is no tombstoning: once an entry is
//! gone the address is eligible again on the next run.

use rusqlite::params;

use dunner_core::DunnerError;

use crate::database::Database;
use crate::models::OptOutEntry;

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<OptOutEntry, rusqlite::Error> {
    Ok(OptOutEntry {
        email_address: row.get(0)?,
        opted_out_all: row.get(1)?,
        opted_out_reminders: row.get(2)?,
        opted_out_collections: row.get(3)?,
        reason: row.get(4)?,
        opt_out_date: row.get(5)?,
    })
}

/// Insert or replace an opt-out entry keyed by email address.
pub async fn upsert_opt_out(db: &Database, entry: &OptOutEntry) -> Result<(), DunnerError> {
    let e = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO opt_outs
                 (email_address, opted_out_all, opted_out_reminders,
                  opted_out_collections, reason)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (email_address) DO UPDATE SET
                 opted_out_all = excluded.opted_out_all,
                 opted_out_reminders = excluded.opted_out_reminders,
                 opted_out_collections = excluded.opted_out_collections,
                 reason = excluded.reason",
                params![
                    e.email_address,
                    e.opted_out_all,
                    e.opted_out_reminders,
                    e.opted_out_collections,
                    e.reason,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Hard-delete an opt-out entry. Returns false if the address had none.
pub async fn delete_opt_out(db: &Database, email_address: &str) -> Result<bool, DunnerError> {
    let email = email_address.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM opt_outs WHERE email_address = ?1",
                params![email],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the entry for one address.
pub async fn get_opt_out(
    db: &Database,
    email_address: &str,
) -> Result<Option<OptOutEntry>, DunnerError> {
    let email = email_address.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT email_address, opted_out_all, opted_out_reminders,
                        opted_out_collections, reason, opt_out_date
                 FROM opt_outs WHERE email_address = ?1",
            )?;
            match stmt.query_row(params![email], row_to_entry) {
                Ok(e) => Ok(Some(e)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the whole registry, ordered by address.
pub async fn list_opt_outs(db: &Database) -> Result<Vec<OptOutEntry>, DunnerError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT email_address, opted_out_all, opted_out_reminders,
                        opted_out_collections, reason, opt_out_date
                 FROM opt_outs ORDER BY email_address ASC",
            )?;
            let rows = stmt.query_map([], row_to_entry)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(email: &str, all: bool) -> OptOutEntry {
        OptOutEntry {
            email_address: email.to_string(),
            opted_out_all: all,
            opted_out_reminders: !all,
            opted_out_collections: false,
            reason: Some("requested by customer".to_string()),
            opt_out_date: String::new(), // assigned by the database
        }
    }

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_and_get_round_trip() {
        let (db, _dir) = setup_db().await;

        upsert_opt_out(&db, &entry("a@b.com", true)).await.unwrap();
        let fetched = get_opt_out(&db, "a@b.com").await.unwrap().unwrap();
        assert!(fetched.opted_out_all);
        assert!(!fetched.opt_out_date.is_empty(), "date should be assigned");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_replaces_scopes() {
        let (db, _dir) = setup_db().await;

        upsert_opt_out(&db, &entry("a@b.com", false)).await.unwrap();
        upsert_opt_out(&db, &entry("a@b.com", true)).await.unwrap();

        let all = list_opt_outs(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].opted_out_all);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_hard() {
        let (db, _dir) = setup_db().await;

        upsert_opt_out(&db, &entry("a@b.com", true)).await.unwrap();
        assert!(delete_opt_out(&db, "a@b.com").await.unwrap());
        assert!(get_opt_out(&db, "a@b.com").await.unwrap().is_none());
        // Second delete finds nothing.
        assert!(!delete_opt_out(&db, "a@b.com").await.unwrap());

        db.close().await.unwrap();
    }
}
