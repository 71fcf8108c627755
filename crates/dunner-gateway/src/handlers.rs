// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the automation REST API.
//!
//! Every route under `/automated-emails` is a thin translation layer:
//! deserialize the body, call the engine or a storage query, serialize the
//! result. No business rules live here.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use dunner_core::error::DunnerError;
use dunner_core::types::{
    Campaign, CampaignType, OptOutEntry, RunTrigger, SendFrequency, SendStatus, SystemSettings,
};
use dunner_engine::orchestrator::{PreviewReport, RunOutcome, RunRequest};
use dunner_storage::queries::{campaigns, opt_outs, run_log, send_history, settings};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Engine errors mapped onto HTTP statuses.
pub struct ApiError(pub DunnerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DunnerError::RunActive => StatusCode::CONFLICT,
            DunnerError::Config(_) => StatusCode::BAD_REQUEST,
            DunnerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            DunnerError::Feed { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<DunnerError> for ApiError {
    fn from(err: DunnerError) -> Self {
        Self(err)
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{what} not found"),
        }),
    )
        .into_response()
}

// ---- run & preview -------------------------------------------------------

/// Request body for POST /automated-emails/run.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRunRequest {
    /// Force test routing for this run regardless of stored settings.
    #[serde(default)]
    pub test_mode: bool,
}

/// Response body for POST /automated-emails/run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRunResponse {
    pub run_id: i64,
    pub emails_scheduled: i64,
    pub emails_sent: i64,
    pub emails_failed: i64,
    pub emails_cancelled: i64,
    pub emails_deferred: i64,
}

impl From<RunOutcome> for TriggerRunResponse {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            run_id: outcome.run_id,
            emails_scheduled: outcome.emails_scheduled,
            emails_sent: outcome.emails_sent,
            emails_failed: outcome.emails_failed,
            emails_cancelled: outcome.emails_cancelled,
            emails_deferred: outcome.emails_deferred,
        }
    }
}

/// POST /automated-emails/run
///
/// Executes one run synchronously and returns its counters, or `409` when
/// a run is already active.
pub async fn post_run(
    State(state): State<GatewayState>,
    Json(body): Json<TriggerRunRequest>,
) -> Result<Json<TriggerRunResponse>, ApiError> {
    let request = RunRequest {
        trigger: if body.test_mode {
            RunTrigger::Test
        } else {
            RunTrigger::Manual
        },
        operator: None,
        force_test: body.test_mode,
    };
    let outcome = state.orchestrator.execute(request, &state.shutdown).await?;
    Ok(Json(outcome.into()))
}

/// Response body for GET /automated-emails/preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub generated_at: String,
    pub system_active: bool,
    pub test_mode: bool,
    pub budget_remaining: i64,
    pub total_eligible: i64,
    pub would_send: i64,
    pub campaigns: Vec<PreviewCampaignResponse>,
    pub warnings: Vec<PreviewWarningResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCampaignResponse {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub trigger_days: i64,
    pub total_eligible: i64,
    pub would_send: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewWarningResponse {
    pub campaign_id: i64,
    pub campaign_name: String,
    pub message: String,
}

impl From<PreviewReport> for PreviewResponse {
    fn from(report: PreviewReport) -> Self {
        Self {
            generated_at: report.generated_at,
            system_active: report.system_active,
            test_mode: report.test_mode,
            budget_remaining: report.budget_remaining,
            total_eligible: report.total_eligible,
            would_send: report.would_send,
            campaigns: report
                .campaigns
                .into_iter()
                .map(|c| PreviewCampaignResponse {
                    campaign_id: c.campaign_id,
                    campaign_name: c.campaign_name,
                    trigger_days: c.trigger_days,
                    total_eligible: c.total_eligible,
                    would_send: c.would_send,
                })
                .collect(),
            warnings: report
                .warnings
                .into_iter()
                .map(|w| PreviewWarningResponse {
                    campaign_id: w.campaign_id,
                    campaign_name: w.campaign_name,
                    message: w.message,
                })
                .collect(),
        }
    }
}

/// GET /automated-emails/preview
pub async fn get_preview(
    State(state): State<GatewayState>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let report = state.orchestrator.preview(None).await?;
    Ok(Json(report.into()))
}

// ---- system settings -----------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCapsRequest {
    pub hourly_cap: i64,
    pub daily_cap: i64,
}

/// Persisted settings projection, returned after every mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub system_active: bool,
    pub global_test_mode: bool,
    pub global_test_email: Option<String>,
    pub automation_sender_email: String,
    pub hourly_send_cap: i64,
    pub daily_send_cap: i64,
}

impl From<SystemSettings> for SettingsResponse {
    fn from(s: SystemSettings) -> Self {
        Self {
            system_active: s.system_active,
            global_test_mode: s.global_test_mode,
            global_test_email: s.global_test_email,
            automation_sender_email: s.automation_sender_email,
            hourly_send_cap: s.hourly_send_cap,
            daily_send_cap: s.daily_send_cap,
        }
    }
}

async fn settings_response(state: &GatewayState) -> Result<Json<SettingsResponse>, ApiError> {
    let current = settings::get_system_settings(&state.db).await?;
    Ok(Json(current.into()))
}

/// POST /automated-emails/system/toggle
///
/// Settings take effect on the next run, never retroactively.
pub async fn post_system_toggle(
    State(state): State<GatewayState>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    settings::set_system_active(&state.db, body.enabled).await?;
    tracing::info!(enabled = body.enabled, "system toggle updated");
    settings_response(&state).await
}

/// POST /automated-emails/global-test-mode
pub async fn post_global_test_mode(
    State(state): State<GatewayState>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    settings::set_global_test_mode(&state.db, body.enabled).await?;
    tracing::info!(enabled = body.enabled, "global test mode updated");
    settings_response(&state).await
}

/// POST /automated-emails/global-test-email
pub async fn post_global_test_email(
    State(state): State<GatewayState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if !body.email.contains('@') {
        return Err(DunnerError::Config(format!("invalid email address: {}", body.email)).into());
    }
    settings::set_global_test_email(&state.db, &body.email).await?;
    settings_response(&state).await
}

/// POST /automated-emails/sender-email
pub async fn post_sender_email(
    State(state): State<GatewayState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if !body.email.contains('@') {
        return Err(DunnerError::Config(format!("invalid email address: {}", body.email)).into());
    }
    settings::set_sender_email(&state.db, &body.email).await?;
    settings_response(&state).await
}

/// POST /automated-emails/send-caps
pub async fn post_send_caps(
    State(state): State<GatewayState>,
    Json(body): Json<SendCapsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if body.hourly_cap < 1 || body.daily_cap < 1 {
        return Err(DunnerError::Config("send caps must be at least 1".to_string()).into());
    }
    settings::set_send_caps(&state.db, body.hourly_cap, body.daily_cap).await?;
    settings_response(&state).await
}

// ---- campaigns -----------------------------------------------------------

/// Request body for creating or updating a campaign.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    pub name: String,
    pub campaign_type: CampaignType,
    pub trigger_days: i64,
    pub send_frequency: SendFrequency,
    #[serde(default)]
    pub recurring_interval_days: Option<i64>,
    #[serde(default)]
    pub max_reminders: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub subject_template: String,
    pub body_template: String,
}

fn default_true() -> bool {
    true
}

impl CampaignRequest {
    fn into_campaign(self, id: i64) -> Result<Campaign, DunnerError> {
        if self.trigger_days <= 0 {
            return Err(DunnerError::Config(
                "triggerDays must be positive".to_string(),
            ));
        }
        if self.send_frequency == SendFrequency::Recurring
            && !self.recurring_interval_days.is_some_and(|d| d > 0)
        {
            return Err(DunnerError::Config(
                "recurring campaigns require a positive recurringIntervalDays".to_string(),
            ));
        }
        if self.max_reminders.is_some_and(|m| m <= 0) {
            return Err(DunnerError::Config(
                "maxReminders must be positive".to_string(),
            ));
        }
        Ok(Campaign {
            id,
            name: self.name,
            campaign_type: self.campaign_type,
            trigger_days: self.trigger_days,
            send_frequency: self.send_frequency,
            recurring_interval_days: self.recurring_interval_days,
            max_reminders: self.max_reminders,
            is_active: self.is_active,
            subject_template: self.subject_template,
            body_template: self.body_template,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub id: i64,
    pub name: String,
    pub campaign_type: CampaignType,
    pub trigger_days: i64,
    pub send_frequency: SendFrequency,
    pub recurring_interval_days: Option<i64>,
    pub max_reminders: Option<i64>,
    pub is_active: bool,
    pub subject_template: String,
    pub body_template: String,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        Self {
            id: c.id,
            name: c.name,
            campaign_type: c.campaign_type,
            trigger_days: c.trigger_days,
            send_frequency: c.send_frequency,
            recurring_interval_days: c.recurring_interval_days,
            max_reminders: c.max_reminders,
            is_active: c.is_active,
            subject_template: c.subject_template,
            body_template: c.body_template,
        }
    }
}

/// GET /automated-emails/campaigns
pub async fn get_campaigns(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<CampaignResponse>>, ApiError> {
    let list = campaigns::list_campaigns(&state.db).await?;
    Ok(Json(list.into_iter().map(Into::into).collect()))
}

/// POST /automated-emails/campaigns
pub async fn post_campaign(
    State(state): State<GatewayState>,
    Json(body): Json<CampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    let mut campaign = body.into_campaign(0)?;
    let id = campaigns::create_campaign(&state.db, &campaign).await?;
    campaign.id = id;
    tracing::info!(campaign_id = id, name = campaign.name.as_str(), "campaign created");
    Ok((StatusCode::CREATED, Json(campaign.into())))
}

/// GET /automated-emails/campaigns/{id}
pub async fn get_campaign(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match campaigns::get_campaign(&state.db, id).await? {
        Some(campaign) => Ok(Json(CampaignResponse::from(campaign)).into_response()),
        None => Ok(not_found("campaign")),
    }
}

/// PUT /automated-emails/campaigns/{id}
pub async fn put_campaign(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Json(body): Json<CampaignRequest>,
) -> Result<Response, ApiError> {
    let campaign = body.into_campaign(id)?;
    if !campaigns::update_campaign(&state.db, &campaign).await? {
        return Ok(not_found("campaign"));
    }
    Ok(Json(CampaignResponse::from(campaign)).into_response())
}

/// Request body for PUT /automated-emails/campaigns/{id}/template.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub subject_template: String,
    pub body_template: String,
}

/// PUT /automated-emails/campaigns/{id}/template
pub async fn put_campaign_template(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Json(body): Json<TemplateRequest>,
) -> Result<Response, ApiError> {
    if !campaigns::update_template(&state.db, id, &body.subject_template, &body.body_template)
        .await?
    {
        return Ok(not_found("campaign"));
    }
    match campaigns::get_campaign(&state.db, id).await? {
        Some(campaign) => Ok(Json(CampaignResponse::from(campaign)).into_response()),
        None => Ok(not_found("campaign")),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTestResponse {
    pub sent_to: String,
}

/// POST /automated-emails/campaigns/{id}/test
///
/// Sends one sample email through the real transport, honoring the
/// dispatch router's test overrides. Writes no send history.
pub async fn post_campaign_test(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
) -> Result<Json<CampaignTestResponse>, ApiError> {
    let sent_to = state.orchestrator.send_campaign_test(id, None).await?;
    Ok(Json(CampaignTestResponse { sent_to }))
}

// ---- opt-outs ------------------------------------------------------------

/// Request body for POST /automated-emails/opt-out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutRequest {
    pub email_address: String,
    #[serde(default)]
    pub opted_out_all: bool,
    #[serde(default)]
    pub opted_out_reminders: bool,
    #[serde(default)]
    pub opted_out_collections: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutResponse {
    pub email_address: String,
    pub opted_out_all: bool,
    pub opted_out_reminders: bool,
    pub opted_out_collections: bool,
    pub reason: Option<String>,
    pub opt_out_date: String,
}

impl From<OptOutEntry> for OptOutResponse {
    fn from(e: OptOutEntry) -> Self {
        Self {
            email_address: e.email_address,
            opted_out_all: e.opted_out_all,
            opted_out_reminders: e.opted_out_reminders,
            opted_out_collections: e.opted_out_collections,
            reason: e.reason,
            opt_out_date: e.opt_out_date,
        }
    }
}

/// POST /automated-emails/opt-out
///
/// Upserts by email address; re-posting replaces the existing scopes.
pub async fn post_opt_out(
    State(state): State<GatewayState>,
    Json(body): Json<OptOutRequest>,
) -> Result<Json<OptOutResponse>, ApiError> {
    if !body.email_address.contains('@') {
        return Err(
            DunnerError::Config(format!("invalid email address: {}", body.email_address)).into(),
        );
    }
    if !body.opted_out_all && !body.opted_out_reminders && !body.opted_out_collections {
        return Err(DunnerError::Config(
            "at least one opt-out scope is required".to_string(),
        )
        .into());
    }

    let entry = OptOutEntry {
        email_address: body.email_address.clone(),
        opted_out_all: body.opted_out_all,
        opted_out_reminders: body.opted_out_reminders,
        opted_out_collections: body.opted_out_collections,
        reason: body.reason,
        opt_out_date: chrono::Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    };
    opt_outs::upsert_opt_out(&state.db, &entry).await?;
    tracing::info!(email = entry.email_address.as_str(), "opt-out recorded");

    let stored = opt_outs::get_opt_out(&state.db, &body.email_address)
        .await?
        .unwrap_or(entry);
    Ok(Json(stored.into()))
}

/// Request body for DELETE /automated-emails/opt-out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutDeleteRequest {
    pub email_address: String,
}

/// DELETE /automated-emails/opt-out
///
/// Hard delete; there is no tombstoning.
pub async fn delete_opt_out(
    State(state): State<GatewayState>,
    Json(body): Json<OptOutDeleteRequest>,
) -> Result<Response, ApiError> {
    if opt_outs::delete_opt_out(&state.db, &body.email_address).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(not_found("opt-out"))
    }
}

/// GET /automated-emails/opt-outs
pub async fn get_opt_outs(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<OptOutResponse>>, ApiError> {
    let list = opt_outs::list_opt_outs(&state.db).await?;
    Ok(Json(list.into_iter().map(Into::into).collect()))
}

// ---- observability -------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLogResponse {
    pub id: i64,
    pub run_started_at: String,
    pub run_completed_at: Option<String>,
    pub status: String,
    pub triggered_by: String,
    pub emails_sent: i64,
    pub error_message: Option<String>,
    pub summary: Option<String>,
}

/// GET /automated-emails/logs
pub async fn get_logs(
    State(state): State<GatewayState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RunLogResponse>>, ApiError> {
    let runs = run_log::list_runs(&state.db, query.limit.clamp(1, 500)).await?;
    Ok(Json(
        runs.into_iter()
            .map(|r| RunLogResponse {
                id: r.id,
                run_started_at: r.run_started_at,
                run_completed_at: r.run_completed_at,
                status: r.status.to_string(),
                triggered_by: r.triggered_by.to_string(),
                emails_sent: r.emails_sent,
                error_message: r.error_message,
                summary: r.summary,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub settings: SettingsResponse,
    /// Send-history record counts keyed by status.
    pub send_counts: std::collections::BTreeMap<String, i64>,
    pub uptime_secs: u64,
}

/// GET /automated-emails/stats
pub async fn get_stats(
    State(state): State<GatewayState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let current = settings::get_system_settings(&state.db).await?;
    let counts = send_history::status_counts(&state.db).await?;
    Ok(Json(StatsResponse {
        settings: current.into(),
        send_counts: counts.into_iter().collect(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRecordResponse {
    pub id: i64,
    pub invoice_id: i64,
    pub campaign_id: i64,
    pub recipient_email: String,
    pub intended_recipient: String,
    pub status: String,
    pub scheduled_for: String,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledResponse {
    /// Records deferred by the rate limiter, awaiting a future run.
    pub pending: Vec<SendRecordResponse>,
    /// Records currently in dispatch.
    pub scheduled: Vec<SendRecordResponse>,
}

fn record_response(r: dunner_core::types::SendRecord) -> SendRecordResponse {
    SendRecordResponse {
        id: r.id,
        invoice_id: r.invoice_id,
        campaign_id: r.campaign_id,
        recipient_email: r.recipient_email,
        intended_recipient: r.intended_recipient,
        status: r.status.to_string(),
        scheduled_for: r.scheduled_for,
        sent_at: r.sent_at,
        error_message: r.error_message,
    }
}

/// GET /automated-emails/scheduled
pub async fn get_scheduled(
    State(state): State<GatewayState>,
) -> Result<Json<ScheduledResponse>, ApiError> {
    let pending = send_history::list_by_status(&state.db, SendStatus::Pending).await?;
    let scheduled = send_history::list_by_status(&state.db, SendStatus::Scheduled).await?;
    Ok(Json(ScheduledResponse {
        pending: pending.into_iter().map(record_response).collect(),
        scheduled: scheduled.into_iter().map(record_response).collect(),
    }))
}

// ---- health --------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health (unauthenticated)
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_request_defaults_test_mode_off() {
        let req: TriggerRunRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.test_mode);
        let req: TriggerRunRequest = serde_json::from_str(r#"{"testMode": true}"#).unwrap();
        assert!(req.test_mode);
    }

    #[test]
    fn campaign_request_validates_shape() {
        let json = r#"{
            "name": "61-day notice",
            "campaignType": "collections_notice",
            "triggerDays": 61,
            "sendFrequency": "recurring",
            "recurringIntervalDays": 14,
            "subjectTemplate": "Invoice {{invoice_id}}",
            "bodyTemplate": "{{amount_due}} outstanding"
        }"#;
        let req: CampaignRequest = serde_json::from_str(json).unwrap();
        let campaign = req.into_campaign(0).unwrap();
        assert!(campaign.is_active);
        assert_eq!(campaign.recurring_interval_days, Some(14));

        let bad: CampaignRequest = serde_json::from_str(
            r#"{
                "name": "broken",
                "campaignType": "payment_reminder",
                "triggerDays": 31,
                "sendFrequency": "recurring",
                "subjectTemplate": "s",
                "bodyTemplate": "b"
            }"#,
        )
        .unwrap();
        assert!(bad.into_campaign(0).is_err());
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "an automation run is already active".to_string(),
        })
        .unwrap();
        assert!(json.contains("already active"));
    }

    #[test]
    fn run_response_uses_camel_case() {
        let json = serde_json::to_string(&TriggerRunResponse {
            run_id: 1,
            emails_scheduled: 4,
            emails_sent: 3,
            emails_failed: 1,
            emails_cancelled: 0,
            emails_deferred: 2,
        })
        .unwrap();
        assert!(json.contains("\"emailsScheduled\":4"));
        assert!(json.contains("\"emailsSent\":3"));
    }
}
