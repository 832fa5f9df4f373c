//! Member profile endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use fabula_common::AppResult;
use fabula_core::{MemberProfile, UpdateProfileInput};
use serde::Deserialize;

use super::stories::StoryResponse;
use crate::{extractors::AuthMember, middleware::AppState, response::ApiResponse};

/// Get the authenticated member's own profile.
async fn get_me(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MemberProfile>> {
    let profile = state.member_service.get_profile(&member.id).await?;

    Ok(ApiResponse::ok(profile))
}

/// Update the authenticated member's own profile.
async fn update_me(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<MemberProfile>> {
    let profile = state
        .member_service
        .update_profile(&member.id, input)
        .await?;

    Ok(ApiResponse::ok(profile))
}

/// Own stories query.
#[derive(Debug, Deserialize)]
pub struct MyStoriesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List the authenticated member's own stories, drafts included.
async fn list_my_stories(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Query(query): Query<MyStoriesQuery>,
) -> AppResult<ApiResponse<Vec<StoryResponse>>> {
    let stories = state
        .story_service
        .list_by_author(&member.id, query.limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(
        stories.into_iter().map(StoryResponse::from).collect(),
    ))
}

/// Get a member's public profile.
async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MemberProfile>> {
    let profile = state.member_service.get_profile(&id).await?;

    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me", put(update_me))
        .route("/me/stories", get(list_my_stories))
        .route("/{id}", get(get_member))
}
