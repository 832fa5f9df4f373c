//! API endpoints.

mod admin;
mod auth;
mod bookmarks;
mod categories;
mod members;
mod progress;
mod stories;
mod tags;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/members", members::router())
        .nest("/stories", stories::router())
        .nest("/bookmarks", bookmarks::router())
        .nest("/progress", progress::router())
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .nest("/admin", admin::router())
}
