//! Bookmark endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use fabula_common::AppResult;
use fabula_core::BookmarkedStory;
use fabula_db::entities::bookmark;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthMember, middleware::AppState, response::ApiResponse};

/// Bookmark listing query.
#[derive(Debug, Deserialize)]
pub struct ListBookmarksQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Bookmark listing response.
#[derive(Debug, Serialize)]
pub struct BookmarkListResponse {
    pub bookmarks: Vec<BookmarkedStory>,
    pub total: u64,
}

/// List the caller's bookmarks, newest first.
async fn list_bookmarks(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Query(query): Query<ListBookmarksQuery>,
) -> AppResult<ApiResponse<BookmarkListResponse>> {
    let bookmarks = state
        .bookmark_service
        .list_by_member(&member.id, query.limit, query.offset)
        .await?;
    let total = state.bookmark_service.count(&member.id).await?;

    Ok(ApiResponse::ok(BookmarkListResponse { bookmarks, total }))
}

/// Add bookmark request.
#[derive(Debug, Deserialize)]
pub struct AddBookmarkRequest {
    pub story_id: String,
}

/// Bookmark a story.
async fn add_bookmark(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(req): Json<AddBookmarkRequest>,
) -> AppResult<ApiResponse<bookmark::Model>> {
    let bookmark = state.bookmark_service.add(&member.id, &req.story_id).await?;

    Ok(ApiResponse::ok(bookmark))
}

/// Bookmark status response.
#[derive(Debug, Serialize)]
pub struct BookmarkStatusResponse {
    pub bookmarked: bool,
}

/// Check whether the caller has bookmarked a story.
async fn get_bookmark(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> AppResult<ApiResponse<BookmarkStatusResponse>> {
    let bookmarked = state
        .bookmark_service
        .is_bookmarked(&member.id, &story_id)
        .await?;

    Ok(ApiResponse::ok(BookmarkStatusResponse { bookmarked }))
}

/// Remove a bookmark.
async fn remove_bookmark(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state
        .bookmark_service
        .remove(&member.id, &story_id)
        .await?;

    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookmarks).post(add_bookmark))
        .route("/{story_id}", get(get_bookmark).delete(remove_bookmark))
}
