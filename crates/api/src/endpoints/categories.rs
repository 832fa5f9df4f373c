//! Category endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use fabula_common::AppResult;
use fabula_core::{CreateCategoryInput, StoryListItem, UpdateCategoryInput};
use fabula_db::entities::category;
use serde::Deserialize;

use crate::{
    extractors::{AuthMember, MaybeAuthMember},
    middleware::AppState,
    response::ApiResponse,
};

/// List categories. Admins see inactive ones too.
async fn list_categories(
    MaybeAuthMember(member): MaybeAuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let categories = match member {
        Some(ref actor) if actor.is_admin => state.category_service.list_all(actor).await?,
        _ => state.category_service.list_active().await?,
    };

    Ok(ApiResponse::ok(categories))
}

/// Create a category.
async fn create_category(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.category_service.create(&member, input).await?;

    Ok(ApiResponse::ok(category))
}

/// Get a category by slug.
async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.category_service.get_by_slug(&slug).await?;

    Ok(ApiResponse::ok(category))
}

/// Get a category.
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.category_service.get(&id).await?;

    Ok(ApiResponse::ok(category))
}

/// Update a category.
async fn update_category(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCategoryInput>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state.category_service.update(&id, &member, input).await?;

    Ok(ApiResponse::ok(category))
}

/// Delete a category. Refused while stories still reference it.
async fn delete_category(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.category_service.delete(&id, &member).await?;

    Ok(ApiResponse::ok(()))
}

/// Category stories query.
#[derive(Debug, Deserialize)]
pub struct CategoryStoriesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List published stories in a category.
async fn list_category_stories(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CategoryStoriesQuery>,
) -> AppResult<ApiResponse<Vec<StoryListItem>>> {
    let stories = state
        .story_service
        .list_by_category(&id, query.limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(stories))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/slug/{slug}", get(get_category_by_slug))
        .route("/{id}", get(get_category).put(update_category).delete(delete_category))
        .route("/{id}/stories", get(list_category_stories))
}
