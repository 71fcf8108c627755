// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign catalog operations.

use rusqlite::params;

use dunner_core::DunnerError;

use crate::database::Database;
use crate::models::Campaign;

const CAMPAIGN_COLUMNS: &str = "id, name, campaign_type, trigger_days, send_frequency,
     recurring_interval_days, max_reminders, is_active, subject_template, body_template";

fn row_to_campaign(row: &rusqlite::Row<'_>) -> Result<Campaign, rusqlite::Error> {
    let campaign_type: String = row.get(2)?;
    let send_frequency: String = row.get(4)?;
    Ok(Campaign {
        id: row.get(0)?,
        name: row.get(1)?,
        campaign_type: campaign_type.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        trigger_days: row.get(3)?,
        send_frequency: send_frequency.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        recurring_interval_days: row.get(5)?,
        max_reminders: row.get(6)?,
        is_active: row.get(7)?,
        subject_template: row.get(8)?,
        body_template: row.get(9)?,
    })
}

/// List every campaign, active or not, ordered by trigger_days.
pub async fn list_campaigns(db: &Database) -> Result<Vec<Campaign>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns ORDER BY trigger_days ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_campaign)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List only active campaigns (the catalog a run evaluates).
pub async fn list_active_campaigns(db: &Database) -> Result<Vec<Campaign>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns
                 WHERE is_active = 1
                 ORDER BY trigger_days ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_campaign)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one campaign by id.
pub async fn get_campaign(db: &Database, id: i64) -> Result<Option<Campaign>, DunnerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], row_to_campaign) {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a new campaign. The `id` field of the input is ignored; returns
/// the auto-generated id.
pub async fn create_campaign(db: &Database, campaign: &Campaign) -> Result<i64, DunnerError> {
    let c = campaign.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaigns
                 (name, campaign_type, trigger_days, send_frequency,
                  recurring_interval_days, max_reminders, is_active,
                  subject_template, body_template)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    c.name,
                    c.campaign_type.to_string(),
                    c.trigger_days,
                    c.send_frequency.to_string(),
                    c.recurring_interval_days,
                    c.max_reminders,
                    c.is_active,
                    c.subject_template,
                    c.body_template,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update an existing campaign by id. Returns false if no row matched.
pub async fn update_campaign(db: &Database, campaign: &Campaign) -> Result<bool, DunnerError> {
    let c = campaign.clone();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE campaigns SET
                 name = ?1, campaign_type = ?2, trigger_days = ?3, send_frequency = ?4,
                 recurring_interval_days = ?5, max_reminders = ?6, is_active = ?7,
                 subject_template = ?8, body_template = ?9,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?10",
                params![
                    c.name,
                    c.campaign_type.to_string(),
                    c.trigger_days,
                    c.send_frequency.to_string(),
                    c.recurring_interval_days,
                    c.max_reminders,
                    c.is_active,
                    c.subject_template,
                    c.body_template,
                    c.id,
                ],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update only the templates of a campaign. Returns false if no row matched.
pub async fn update_template(
    db: &Database,
    id: i64,
    subject_template: &str,
    body_template: &str,
) -> Result<bool, DunnerError> {
    let subject = subject_template.to_string();
    let body = body_template.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE campaigns SET subject_template = ?1, body_template = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![subject, body, id],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dunner_core::types::{CampaignType, SendFrequency};
    use tempfile::tempdir;

    pub(crate) fn sample_campaign(trigger_days: i64) -> Campaign {
        Campaign {
            id: 0,
            name: format!("{trigger_days}-day reminder"),
            campaign_type: CampaignType::PaymentReminder,
            trigger_days,
            send_frequency: SendFrequency::Once,
            recurring_interval_days: None,
            max_reminders: None,
            is_active: true,
            subject_template: "Invoice {{invoice_id}} is overdue".to_string(),
            body_template: "Amount due: {{amount_due}}".to_string(),
        }
    }

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (db, _dir) = setup_db().await;

        let id = create_campaign(&db, &sample_campaign(31)).await.unwrap();
        assert!(id > 0);

        let fetched = get_campaign(&db, id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.trigger_days, 31);
        assert_eq!(fetched.campaign_type, CampaignType::PaymentReminder);
        assert_eq!(fetched.send_frequency, SendFrequency::Once);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_active_excludes_inactive() {
        let (db, _dir) = setup_db().await;

        let mut inactive = sample_campaign(61);
        inactive.is_active = false;
        create_campaign(&db, &sample_campaign(31)).await.unwrap();
        create_campaign(&db, &inactive).await.unwrap();

        let all = list_campaigns(&db).await.unwrap();
        let active = list_active_campaigns(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].trigger_days, 31);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_campaign_changes_fields() {
        let (db, _dir) = setup_db().await;

        let id = create_campaign(&db, &sample_campaign(31)).await.unwrap();
        let mut updated = sample_campaign(31);
        updated.id = id;
        updated.send_frequency = SendFrequency::Recurring;
        updated.recurring_interval_days = Some(7);
        updated.max_reminders = Some(3);
        assert!(update_campaign(&db, &updated).await.unwrap());

        let fetched = get_campaign(&db, id).await.unwrap().unwrap();
        assert_eq!(fetched.send_frequency, SendFrequency::Recurring);
        assert_eq!(fetched.recurring_interval_days, Some(7));
        assert_eq!(fetched.max_reminders, Some(3));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_template_only_touches_templates() {
        let (db, _dir) = setup_db().await;

        let id = create_campaign(&db, &sample_campaign(91)).await.unwrap();
        assert!(
            update_template(&db, id, "Final notice {{invoice_id}}", "Pay now")
                .await
                .unwrap()
        );

        let fetched = get_campaign(&db, id).await.unwrap().unwrap();
        assert_eq!(fetched.subject_template, "Final notice {{invoice_id}}");
        assert_eq!(fetched.body_template, "Pay now");
        assert_eq!(fetched.trigger_days, 91);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_missing_campaign_returns_false() {
        let (db, _dir) = setup_db().await;
        let mut ghost = sample_campaign(31);
        ghost.id = 999;
        assert!(!update_campaign(&db, &ghost).await.unwrap());
        db.close().await.unwrap();
    }
}
