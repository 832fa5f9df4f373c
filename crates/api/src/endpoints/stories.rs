//! Story endpoints.
//!
//! Covers public reading, authoring, the publishing lifecycle, ratings,
//! and per-story tags.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use fabula_common::AppResult;
use fabula_core::{
    CreateStoryInput, PublishOptions, RatingSnapshot, StoryDetail, StoryListItem, UpdateStoryInput,
};
use fabula_db::entities::{member_story_rating, story, story::PublishingState, tag};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthMember, ClientMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create story router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stories).post(create_story))
        .route("/top", get(top_stories))
        .route("/slug/{slug}", get(get_story_by_slug))
        .route("/{id}", get(get_story).put(update_story).delete(delete_story))
        .route("/{id}/editor", get(get_story_for_editor))
        .route("/{id}/publish", post(publish_story))
        .route("/{id}/unpublish", post(unpublish_story))
        .route("/{id}/schedule", post(schedule_story))
        .route("/{id}/extend", post(extend_story))
        .route("/{id}/window", put(update_window))
        .route(
            "/{id}/rating",
            put(rate_story).get(get_own_rating).delete(remove_rating),
        )
        .route("/{id}/ratings", get(list_ratings))
        .route("/{id}/tags", get(list_story_tags).post(attach_tag))
        .route("/{id}/tags/{name}", delete(detach_tag))
}

/// Full story payload for authors and admins.
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub id: String,
    pub author_id: String,
    pub category_id: String,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub body: String,
    pub cover_image_url: Option<String>,
    pub view_count: i64,
    pub reading_time_minutes: i32,
    pub state: PublishingState,
    pub active: bool,
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<story::Model> for StoryResponse {
    fn from(story: story::Model) -> Self {
        let state = story.publishing_state(Utc::now());
        Self {
            id: story.id,
            author_id: story.author_id,
            category_id: story.category_id,
            title: story.title,
            slug: story.slug,
            summary: story.summary,
            body: story.body,
            cover_image_url: story.cover_image_url,
            view_count: story.view_count,
            reading_time_minutes: story.reading_time_minutes,
            state,
            active: story.active,
            active_from: story.active_from,
            active_until: story.active_until,
            created_at: story.created_at,
            updated_at: story.updated_at,
        }
    }
}

/// Public story detail with category and rating context.
#[derive(Debug, Serialize)]
pub struct StoryDetailResponse {
    pub id: String,
    pub author_id: String,
    pub category_id: String,
    pub category_name: Option<String>,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub body: String,
    pub cover_image_url: Option<String>,
    pub view_count: i64,
    pub reading_time_minutes: i32,
    pub active_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub rating: RatingSnapshot,
}

impl From<StoryDetail> for StoryDetailResponse {
    fn from(detail: StoryDetail) -> Self {
        let StoryDetail {
            story,
            category_name,
            rating,
        } = detail;
        Self {
            id: story.id,
            author_id: story.author_id,
            category_id: story.category_id,
            category_name,
            title: story.title,
            slug: story.slug,
            summary: story.summary,
            body: story.body,
            cover_image_url: story.cover_image_url,
            view_count: story.view_count,
            reading_time_minutes: story.reading_time_minutes,
            active_until: story.active_until,
            created_at: story.created_at,
            rating,
        }
    }
}

/// Story listing query.
#[derive(Debug, Deserialize)]
pub struct ListStoriesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    /// Restrict the listing to one category.
    pub category_id: Option<String>,
}

/// Top stories query.
#[derive(Debug, Deserialize)]
pub struct TopStoriesQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List currently published stories, newest first.
async fn list_stories(
    State(state): State<AppState>,
    Query(query): Query<ListStoriesQuery>,
) -> AppResult<ApiResponse<Vec<StoryListItem>>> {
    let stories = match query.category_id {
        Some(category_id) => {
            state
                .story_service
                .list_by_category(&category_id, query.limit, query.offset)
                .await?
        }
        None => {
            state
                .story_service
                .list_latest(query.limit, query.offset)
                .await?
        }
    };

    Ok(ApiResponse::ok(stories))
}

/// List published stories ranked by quality score.
async fn top_stories(
    State(state): State<AppState>,
    Query(query): Query<TopStoriesQuery>,
) -> AppResult<ApiResponse<Vec<StoryListItem>>> {
    let stories = state.story_service.list_top_rated(query.limit).await?;

    Ok(ApiResponse::ok(stories))
}

/// Create a new story draft.
async fn create_story(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<CreateStoryInput>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state.story_service.create(&member, input).await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Get a published story. Counts a view.
async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StoryDetailResponse>> {
    let detail = state.story_service.get_published(&id).await?;

    Ok(ApiResponse::ok(StoryDetailResponse::from(detail)))
}

/// Get a published story by slug. Counts a view.
async fn get_story_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<ApiResponse<StoryDetailResponse>> {
    let detail = state.story_service.get_by_slug(&slug).await?;

    Ok(ApiResponse::ok(StoryDetailResponse::from(detail)))
}

/// Get a story for editing, whatever its state.
async fn get_story_for_editor(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state.story_service.get_for_editor(&id, &member).await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Update story content.
async fn update_story(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateStoryInput>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state.story_service.update(&id, &member, input).await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Delete a story.
async fn delete_story(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.story_service.delete(&id, &member).await?;

    Ok(ApiResponse::ok(()))
}

/// Publish a story. The body is optional; defaults apply when absent.
async fn publish_story(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    options: Option<Json<PublishOptions>>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let options = options.map_or_else(PublishOptions::default, |Json(options)| options);
    let story = state
        .publishing_service
        .publish(&id, &member, options, &meta.into())
        .await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Unpublish a story back to draft.
async fn unpublish_story(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state
        .publishing_service
        .unpublish(&id, &member, &meta.into())
        .await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Schedule request.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub active_from: DateTime<Utc>,
    pub active_until: Option<DateTime<Utc>>,
}

/// Schedule a story for future publication.
async fn schedule_story(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ScheduleRequest>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state
        .publishing_service
        .schedule(&id, &member, req.active_from, req.active_until, &meta.into())
        .await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Extend request.
#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    pub days: i64,
    pub reason: Option<String>,
}

/// Extend a story's publication window.
async fn extend_story(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ExtendRequest>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state
        .publishing_service
        .extend(&id, &member, req.days, req.reason, &meta.into())
        .await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Window update request. Omitted bounds are cleared.
#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    pub active_from: Option<DateTime<Utc>>,
    pub active_until: Option<DateTime<Utc>>,
}

/// Replace a story's publication window.
async fn update_window(
    AuthMember(member): AuthMember,
    meta: ClientMeta,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<WindowRequest>,
) -> AppResult<ApiResponse<StoryResponse>> {
    let story = state
        .publishing_service
        .update_window(&id, &member, req.active_from, req.active_until, &meta.into())
        .await?;

    Ok(ApiResponse::ok(StoryResponse::from(story)))
}

/// Rate request.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

/// Rate a story. Re-rating replaces the previous value.
async fn rate_story(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RateRequest>,
) -> AppResult<ApiResponse<RatingSnapshot>> {
    let aggregate = state
        .rating_service
        .rate(&id, &member.id, req.rating, req.comment)
        .await?;

    Ok(ApiResponse::ok(RatingSnapshot::from_aggregate(Some(
        &aggregate,
    ))))
}

/// Get the caller's own rating of a story.
async fn get_own_rating(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Option<member_story_rating::Model>>> {
    let rating = state
        .rating_service
        .find_member_rating(&member.id, &id)
        .await?;

    Ok(ApiResponse::ok(rating))
}

/// Remove the caller's rating of a story.
async fn remove_rating(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RatingSnapshot>> {
    let aggregate = state.rating_service.remove_rating(&id, &member.id).await?;

    Ok(ApiResponse::ok(RatingSnapshot::from_aggregate(Some(
        &aggregate,
    ))))
}

/// Ratings listing query.
#[derive(Debug, Deserialize)]
pub struct RatingsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Ratings listing response.
#[derive(Debug, Serialize)]
pub struct RatingListResponse {
    pub ratings: Vec<member_story_rating::Model>,
    pub total: u64,
}

/// List individual ratings of a story.
async fn list_ratings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RatingsQuery>,
) -> AppResult<ApiResponse<RatingListResponse>> {
    let ratings = state
        .rating_service
        .list_by_story(&id, query.limit, query.offset)
        .await?;
    let total = state.rating_service.count_by_story(&id).await?;

    Ok(ApiResponse::ok(RatingListResponse { ratings, total }))
}

/// List tags attached to a story.
async fn list_story_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<tag::Model>>> {
    let tags = state.tag_service.list_for_story(&id).await?;

    Ok(ApiResponse::ok(tags))
}

/// Attach tag request.
#[derive(Debug, Deserialize)]
pub struct AttachTagRequest {
    pub name: String,
}

/// Attach a tag to a story, creating the tag if needed.
async fn attach_tag(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AttachTagRequest>,
) -> AppResult<ApiResponse<tag::Model>> {
    let tag = state.tag_service.attach(&id, &member, &req.name).await?;

    Ok(ApiResponse::ok(tag))
}

/// Detach a tag from a story.
async fn detach_tag(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state.tag_service.detach(&id, &member, &name).await?;

    Ok(ApiResponse::ok(()))
}
