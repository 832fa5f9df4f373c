//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use fabula_core::{
    AnalyticsService, BookmarkService, CategoryService, ExpiryService, MemberService,
    PublishingService, RatingService, ReadingProgressService, SettingsService, StoryService,
    TagService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub member_service: MemberService,
    pub story_service: StoryService,
    pub publishing_service: PublishingService,
    pub rating_service: RatingService,
    pub bookmark_service: BookmarkService,
    pub progress_service: ReadingProgressService,
    pub category_service: CategoryService,
    pub tag_service: TagService,
    pub settings_service: SettingsService,
    pub expiry_service: ExpiryService,
    pub analytics_service: AnalyticsService,
}

/// Authentication middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        if let Ok(member) = state.member_service.authenticate_by_token(token).await {
            req.extensions_mut().insert(member);
        }
    }

    next.run(req).await
}
