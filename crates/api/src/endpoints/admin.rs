//! Admin endpoints.
//!
//! Everything here requires an admin account, gated either in the
//! services or right in the handler for services that have no actor.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use fabula_common::{AppError, AppResult};
use fabula_core::{
    BulkPublishReport, DashboardOverview, ExpiringStory, ExpirySweepReport, UpdateSettingsInput,
};
use fabula_db::entities::{app_settings, member, story_publishing_history};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::stories::StoryResponse;
use crate::{
    extractors::{AuthMember, ClientMeta},
    middleware::AppState,
    response::ApiResponse,
};

fn require_admin(member: &member::Model) -> AppResult<()> {
    if member.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin access required".to_string()))
    }
}

/// Aggregated dashboard counters and leaderboards.
async fn dashboard(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardOverview>> {
    let overview = state.analytics_service.overview(&member).await?;

    Ok(ApiResponse::ok(overview))
}

/// Get the application settings.
async fn get_settings(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<app_settings::Model>> {
    require_admin(&member)?;

    let settings = state.settings_service.get().await?;

    Ok(ApiResponse::ok(settings))
}

/// Update the application settings.
async fn update_settings(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<UpdateSettingsInput>,
) -> AppResult<ApiResponse<app_settings::Model>> {
    require_admin(&member)?;

    info!(member_id = %member.id, "Updating application settings");

    let settings = state.settings_service.update(input).await?;

    Ok(ApiResponse::ok(settings))
}

/// Admin story listing query.
#[derive(Debug, Deserialize)]
pub struct AdminStoriesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List every story regardless of state.
async fn list_stories(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Query(query): Query<AdminStoriesQuery>,
) -> AppResult<ApiResponse<Vec<StoryResponse>>> {
    let stories = state
        .story_service
        .list_all(&member, query.limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(
        stories.into_iter().map(StoryResponse::from).collect(),
    ))
}

/// Expiring stories query.
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    /// Look-ahead window; falls back to the configured default.
    pub within_hours: Option<i64>,
}

/// List published stories whose window ends soon.
async fn list_expiring(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<ApiResponse<Vec<ExpiringStory>>> {
    require_admin(&member)?;

    let stories = state
        .expiry_service
        .find_expiring_soon(query.within_hours)
        .await?;

    Ok(ApiResponse::ok(stories))
}

/// Bulk publish request.
#[derive(Debug, Deserialize)]
pub struct BulkPublishRequest {
    pub story_ids: Vec<String>,
    pub active_until_days: Option<i64>,
}

/// Publish several stories at once. Failures are reported per story.
async fn bulk_publish(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
    Json(req): Json<BulkPublishRequest>,
) -> AppResult<ApiResponse<BulkPublishReport>> {
    require_admin(&member)?;

    let report = state
        .publishing_service
        .bulk_publish(&req.story_ids, &member, req.active_until_days, &meta.into())
        .await?;

    Ok(ApiResponse::ok(report))
}

/// History listing query.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// History listing response.
#[derive(Debug, Serialize)]
pub struct HistoryListResponse {
    pub entries: Vec<story_publishing_history::Model>,
    pub total: u64,
}

/// Audit trail of one story's lifecycle transitions.
async fn story_history(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<ApiResponse<HistoryListResponse>> {
    let entries = state
        .publishing_service
        .history(&id, &member, query.limit, query.offset)
        .await?;
    let total = state.publishing_service.history_count(&id).await?;

    Ok(ApiResponse::ok(HistoryListResponse { entries, total }))
}

/// Deactivate every story whose window has ended.
async fn expiry_sweep(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ExpirySweepReport>> {
    let report = state
        .publishing_service
        .deactivate_expired(&member, &meta.into())
        .await?;

    Ok(ApiResponse::ok(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/stories", get(list_stories))
        .route("/stories/expiring", get(list_expiring))
        .route("/stories/bulk-publish", post(bulk_publish))
        .route("/stories/{id}/history", get(story_history))
        .route("/expiry/sweep", post(expiry_sweep))
}
