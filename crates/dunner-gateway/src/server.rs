// SPDX-FileCopyrightText: 2026 Dunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. The router is exposed
//! separately from the server loop so tests can drive it with
//! `tower::ServiceExt::oneshot` without binding a socket.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dunner_core::DunnerError;
use dunner_engine::Orchestrator;
use dunner_storage::Database;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Arc<Database>,
    pub orchestrator: Arc<Orchestrator>,
    pub auth: AuthConfig,
    /// Process-wide shutdown token; in-flight runs observe it.
    pub shutdown: CancellationToken,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors GatewayConfig from dunner-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for auth (None = all API requests rejected).
    pub bearer_token: Option<String>,
}

/// Build the full gateway router.
///
/// `/health` is public; everything under `/automated-emails` sits behind
/// the bearer-token middleware.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/automated-emails/run", post(handlers::post_run))
        .route("/automated-emails/preview", get(handlers::get_preview))
        .route(
            "/automated-emails/system/toggle",
            post(handlers::post_system_toggle),
        )
        .route(
            "/automated-emails/global-test-mode",
            post(handlers::post_global_test_mode),
        )
        .route(
            "/automated-emails/global-test-email",
            post(handlers::post_global_test_email),
        )
        .route(
            "/automated-emails/sender-email",
            post(handlers::post_sender_email),
        )
        .route(
            "/automated-emails/send-caps",
            post(handlers::post_send_caps),
        )
        .route(
            "/automated-emails/campaigns",
            get(handlers::get_campaigns).post(handlers::post_campaign),
        )
        .route(
            "/automated-emails/campaigns/{id}",
            get(handlers::get_campaign).put(handlers::put_campaign),
        )
        .route(
            "/automated-emails/campaigns/{id}/template",
            put(handlers::put_campaign_template),
        )
        .route(
            "/automated-emails/campaigns/{id}/test",
            post(handlers::post_campaign_test),
        )
        .route(
            "/automated-emails/opt-out",
            post(handlers::post_opt_out).delete(handlers::delete_opt_out),
        )
        .route("/automated-emails/opt-outs", get(handlers::get_opt_outs))
        .route("/automated-emails/logs", get(handlers::get_logs))
        .route("/automated-emails/stats", get(handlers::get_stats))
        .route("/automated-emails/scheduled", get(handlers::get_scheduled))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server and serve until shutdown.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
) -> Result<(), DunnerError> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DunnerError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| DunnerError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
