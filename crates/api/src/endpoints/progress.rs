//! Reading progress endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use fabula_common::AppResult;
use fabula_core::ProgressItem;
use fabula_db::entities::reading_progress;
use serde::Deserialize;

use crate::{extractors::AuthMember, middleware::AppState, response::ApiResponse};

/// Progress listing query.
#[derive(Debug, Deserialize)]
pub struct ListProgressQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List stories the caller has started but not finished.
async fn list_progress(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Query(query): Query<ListProgressQuery>,
) -> AppResult<ApiResponse<Vec<ProgressItem>>> {
    let items = state
        .progress_service
        .list_in_progress(&member.id, query.limit)
        .await?;

    Ok(ApiResponse::ok(items))
}

/// Record progress request.
#[derive(Debug, Deserialize)]
pub struct RecordProgressRequest {
    pub percent: i32,
}

/// Record how far the caller has read a story. Last write wins.
async fn record_progress(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Json(req): Json<RecordProgressRequest>,
) -> AppResult<ApiResponse<reading_progress::Model>> {
    let progress = state
        .progress_service
        .record(&member.id, &story_id, req.percent)
        .await?;

    Ok(ApiResponse::ok(progress))
}

/// Get the caller's progress on one story.
async fn get_progress(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> AppResult<ApiResponse<Option<reading_progress::Model>>> {
    let progress = state.progress_service.get(&member.id, &story_id).await?;

    Ok(ApiResponse::ok(progress))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_progress))
        .route("/{story_id}", get(get_progress).put(record_progress))
}
