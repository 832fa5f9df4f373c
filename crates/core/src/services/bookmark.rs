//! Bookmark service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fabula_common::{id::IdGenerator, AppError, AppResult};
use fabula_db::entities::bookmark;
use fabula_db::repositories::{BookmarkRepository, StoryRepository};
use sea_orm::Set;
use serde::Serialize;

use super::settings::SettingsService;

/// A bookmark joined with the story it points at.
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkedStory {
    pub bookmark_id: String,
    pub story_id: String,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub cover_image_url: Option<String>,
    pub bookmarked_at: DateTime<Utc>,
}

/// Service for member bookmarks.
#[derive(Clone)]
pub struct BookmarkService {
    bookmark_repo: BookmarkRepository,
    story_repo: StoryRepository,
    settings: SettingsService,
    id_gen: IdGenerator,
}

impl BookmarkService {
    /// Create a new bookmark service.
    #[must_use]
    pub const fn new(
        bookmark_repo: BookmarkRepository,
        story_repo: StoryRepository,
        settings: SettingsService,
    ) -> Self {
        Self {
            bookmark_repo,
            story_repo,
            settings,
            id_gen: IdGenerator::new(),
        }
    }

    /// Bookmark a story for a member.
    pub async fn add(&self, member_id: &str, story_id: &str) -> AppResult<bookmark::Model> {
        let settings = self.settings.get().await?;
        if !settings.bookmarks_enabled {
            return Err(AppError::Forbidden("bookmarks are disabled".to_string()));
        }

        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;
        if !story.is_effectively_published(Utc::now()) {
            return Err(AppError::Validation("story is not published".to_string()));
        }

        if self.bookmark_repo.exists(member_id, story_id).await? {
            return Err(AppError::Conflict("story is already bookmarked".to_string()));
        }

        let model = bookmark::ActiveModel {
            id: Set(self.id_gen.generate()),
            member_id: Set(member_id.to_string()),
            story_id: Set(story_id.to_string()),
            created_at: Set(Utc::now()),
        };

        self.bookmark_repo.create(model).await
    }

    /// Remove a member's bookmark.
    pub async fn remove(&self, member_id: &str, story_id: &str) -> AppResult<()> {
        let deleted = self
            .bookmark_repo
            .delete_by_member_and_story(member_id, story_id)
            .await?;
        if !deleted {
            return Err(AppError::NotFound(format!("no bookmark for story {story_id}")));
        }
        Ok(())
    }

    /// Whether the member has bookmarked the story.
    pub async fn is_bookmarked(&self, member_id: &str, story_id: &str) -> AppResult<bool> {
        self.bookmark_repo.exists(member_id, story_id).await
    }

    /// A member's bookmarks joined with their stories, newest first.
    pub async fn list_by_member(
        &self,
        member_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<BookmarkedStory>> {
        let bookmarks = self
            .bookmark_repo
            .find_by_member(member_id, limit, offset)
            .await?;
        if bookmarks.is_empty() {
            return Ok(Vec::new());
        }

        let story_ids: Vec<String> = bookmarks.iter().map(|b| b.story_id.clone()).collect();
        let stories: HashMap<String, _> = self
            .story_repo
            .find_by_ids(&story_ids)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let mut items = Vec::with_capacity(bookmarks.len());
        for bookmark in bookmarks {
            // Deleting a story cascades to its bookmarks, so the story is
            // present unless the two queries raced a deletion.
            let Some(story) = stories.get(&bookmark.story_id) else {
                continue;
            };
            items.push(BookmarkedStory {
                bookmark_id: bookmark.id,
                story_id: bookmark.story_id,
                title: story.title.clone(),
                slug: story.slug.clone(),
                summary: story.summary.clone(),
                cover_image_url: story.cover_image_url.clone(),
                bookmarked_at: bookmark.created_at,
            });
        }
        Ok(items)
    }

    /// Count a member's bookmarks.
    pub async fn count(&self, member_id: &str) -> AppResult<u64> {
        self.bookmark_repo.count_by_member(member_id).await
    }
}
