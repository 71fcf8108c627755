// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System settings and operator email settings operations.
//!
//! `system_settings` is a single-row table. Mutations here take effect on
//! the NEXT run only: the orchestrator snapshots settings once at entry.

use rusqlite::params;

use dunner_core::DunnerError;

use crate::database::Database;
use crate::models::{OperatorEmailSettings, SystemSettings};

/// Read the settings row.
pub async fn get_system_settings(db: &Database) -> Result<SystemSettings, DunnerError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT system_active, global_test_mode, global_test_email,
                        automation_sender_email, hourly_send_cap, daily_send_cap
                 FROM system_settings WHERE id = 1",
                [],
                |row| {
                    Ok(SystemSettings {
                        system_active: row.get(0)?,
                        global_test_mode: row.get(1)?,
                        global_test_email: row.get(2)?,
                        automation_sender_email: row.get(3)?,
                        hourly_send_cap: row.get(4)?,
                        daily_send_cap: row.get(5)?,
                    })
                },
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Toggle the system-wide kill switch.
pub async fn set_system_active(db: &Database, enabled: bool) -> Result<(), DunnerError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings SET system_active = ?1 WHERE id = 1",
                params![enabled],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Toggle global test mode.
pub async fn set_global_test_mode(db: &Database, enabled: bool) -> Result<(), DunnerError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings SET global_test_mode = ?1 WHERE id = 1",
                params![enabled],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the address every recipient is rewritten to under global test mode.
pub async fn set_global_test_email(db: &Database, email: &str) -> Result<(), DunnerError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings SET global_test_email = ?1 WHERE id = 1",
                params![email],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the from-address for automation email.
pub async fn set_sender_email(db: &Database, email: &str) -> Result<(), DunnerError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings SET automation_sender_email = ?1 WHERE id = 1",
                params![email],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set the hourly and daily send ceilings.
pub async fn set_send_caps(db: &Database, hourly: i64, daily: i64) -> Result<(), DunnerError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE system_settings SET hourly_send_cap = ?1, daily_send_cap = ?2
                 WHERE id = 1",
                params![hourly, daily],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one operator's email settings.
pub async fn get_operator_settings(
    db: &Database,
    operator_id: &str,
) -> Result<Option<OperatorEmailSettings>, DunnerError> {
    let operator_id = operator_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT operator_id, test_mode_enabled, test_recipient, sender_name
                 FROM operator_email_settings WHERE operator_id = ?1",
            )?;
            match stmt.query_row(params![operator_id], |row| {
                Ok(OperatorEmailSettings {
                    operator_id: row.get(0)?,
                    test_mode_enabled: row.get(1)?,
                    test_recipient: row.get(2)?,
                    sender_name: row.get(3)?,
                })
            }) {
                Ok(s) => Ok(Some(s)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or replace one operator's email settings.
pub async fn upsert_operator_settings(
    db: &Database,
    settings: &OperatorEmailSettings,
) -> Result<(), DunnerError> {
    let s = settings.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO operator_email_settings
                 (operator_id, test_mode_enabled, test_recipient, sender_name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (operator_id) DO UPDATE SET
                 test_mode_enabled = excluded.test_mode_enabled,
                 test_recipient = excluded.test_recipient,
                 sender_name = excluded.sender_name",
                params![s.operator_id, s.test_mode_enabled, s.test_recipient, s.sender_name],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn defaults_match_seed_row() {
        let (db, _dir) = setup_db().await;
        let settings = get_system_settings(&db).await.unwrap();
        assert!(settings.system_active);
        assert!(!settings.global_test_mode);
        assert_eq!(settings.hourly_send_cap, 50);
        assert_eq!(settings.daily_send_cap, 500);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn toggles_persist() {
        let (db, _dir) = setup_db().await;

        set_system_active(&db, false).await.unwrap();
        set_global_test_mode(&db, true).await.unwrap();
        set_global_test_email(&db, "qa@example.com").await.unwrap();
        set_sender_email(&db, "billing@example.com").await.unwrap();
        set_send_caps(&db, 10, 100).await.unwrap();

        let settings = get_system_settings(&db).await.unwrap();
        assert!(!settings.system_active);
        assert!(settings.global_test_mode);
        assert_eq!(settings.global_test_email.as_deref(), Some("qa@example.com"));
        assert_eq!(settings.automation_sender_email, "billing@example.com");
        assert_eq!(settings.hourly_send_cap, 10);
        assert_eq!(settings.daily_send_cap, 100);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn operator_settings_upsert_round_trip() {
        let (db, _dir) = setup_db().await;

        assert!(get_operator_settings(&db, "op-1").await.unwrap().is_none());

        let settings = OperatorEmailSettings {
            operator_id: "op-1".to_string(),
            test_mode_enabled: true,
            test_recipient: Some("op1-test@example.com".to_string()),
            sender_name: Some("Accounts".to_string()),
        };
        upsert_operator_settings(&db, &settings).await.unwrap();

        let fetched = get_operator_settings(&db, "op-1").await.unwrap().unwrap();
        assert!(fetched.test_mode_enabled);
        assert_eq!(
            fetched.test_recipient.as_deref(),
            Some("op1-test@example.com")
        );

        // Upsert replaces.
        let off = OperatorEmailSettings {
            test_mode_enabled: false,
            ..settings
        };
        upsert_operator_settings(&db, &off).await.unwrap();
        let fetched = get_operator_settings(&db, "op-1").await.unwrap().unwrap();
        assert!(!fetched.test_mode_enabled);

        db.close().await.unwrap();
    }
}
