//! Admin routes: login, refresh, status and schedule.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::response::ApiResponse;
use super::routes::RouteModule;
use crate::app::AppContext;
use crate::audit::AuditEntry;
use crate::auth::{ADMIN_ACTOR, AdminSession, BearerToken};
use crate::error::Result;
use crate::refresh::{RefreshMode, RefreshStatus};
use crate::schedule::{AutoRefreshUpdate, ScheduleView};

const DEFAULT_ACTIVITY_LIMIT: usize = 20;

pub struct AdminRoutes;

impl RouteModule for AdminRoutes {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/refresh", post(refresh))
            .route("/status", get(status))
            .route("/activity", get(activity))
            .route(
                "/auto-refresh-settings",
                get(get_schedule).post(update_schedule),
            )
    }

    fn prefix(&self) -> Option<&str> {
        Some("/admin")
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: SecretString,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

async fn login(
    State(ctx): State<AppContext>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>> {
    let session = ctx.auth.authenticate(request.password).await?;
    Ok(ApiResponse::success_with_message(
        LoginResponse {
            token: session.token().to_string(),
            expires_at: session.expires_at,
        },
        "Login successful",
    ))
}

/// Always succeeds for a well-formed header; unknown tokens are ignored.
async fn logout(
    State(ctx): State<AppContext>,
    BearerToken(token): BearerToken,
) -> Result<ApiResponse<()>> {
    ctx.auth.invalidate(&token).await?;
    Ok(ApiResponse::message("Logged out"))
}

async fn refresh(State(ctx): State<AppContext>, AdminSession(_): AdminSession) -> Result<Response> {
    match ctx.refresh_mode() {
        RefreshMode::Blocking => {
            let report = ctx.orchestrator.trigger(ADMIN_ACTOR).await?;
            Ok(ApiResponse::success_with_message(report, "Data refreshed successfully").into_response())
        }
        RefreshMode::Background => {
            let ticket = ctx.orchestrator.trigger_background(ADMIN_ACTOR)?;
            Ok(ApiResponse::accepted(ticket, "Refresh started").into_response())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub refresh: RefreshStatus,
    pub auto_refresh: ScheduleView,
    pub source_configured: bool,
    pub has_data: bool,
    pub last_updated: DateTime<Utc>,
    pub session_expires_at: DateTime<Utc>,
}

async fn status(
    State(ctx): State<AppContext>,
    AdminSession(session): AdminSession,
) -> Result<ApiResponse<AdminStatus>> {
    let snapshot = ctx.publisher.current();
    Ok(ApiResponse::success(AdminStatus {
        refresh: ctx.orchestrator.status(),
        auto_refresh: ctx.scheduler.view().await,
        source_configured: ctx.config.source.download_url.is_some(),
        has_data: snapshot.has_data(),
        last_updated: snapshot.dataset.last_updated,
        session_expires_at: session.expires_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    limit: Option<usize>,
}

async fn activity(
    State(ctx): State<AppContext>,
    AdminSession(_): AdminSession,
    Query(query): Query<ActivityQuery>,
) -> Result<ApiResponse<Vec<AuditEntry>>> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    Ok(ApiResponse::success(ctx.audit.recent(limit)))
}

async fn get_schedule(
    State(ctx): State<AppContext>,
    AdminSession(_): AdminSession,
) -> Result<ApiResponse<ScheduleView>> {
    Ok(ApiResponse::success(ctx.scheduler.view().await))
}

async fn update_schedule(
    State(ctx): State<AppContext>,
    AdminSession(_): AdminSession,
    Json(update): Json<AutoRefreshUpdate>,
) -> Result<ApiResponse<ScheduleView>> {
    let view = ctx.scheduler.update(update, ADMIN_ACTOR).await?;
    Ok(ApiResponse::success_with_message(view, "Auto-refresh settings updated"))
}
