//! Tag endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use fabula_common::AppResult;
use fabula_db::entities::tag;
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Tag listing query.
#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    50
}

/// List tags by usage, most used first.
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> AppResult<ApiResponse<Vec<tag::Model>>> {
    let tags = state.tag_service.list(query.limit).await?;

    Ok(ApiResponse::ok(tags))
}

/// Get a tag by name.
async fn get_tag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<ApiResponse<tag::Model>> {
    let tag = state.tag_service.get(&name).await?;

    Ok(ApiResponse::ok(tag))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{name}", get(get_tag))
}
