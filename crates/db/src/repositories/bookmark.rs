//! Bookmark repository.

use std::sync::Arc;

use crate::entities::{Bookmark, bookmark};
use fabula_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Bookmark repository for database operations.
#[derive(Clone)]
pub struct BookmarkRepository {
    db: Arc<DatabaseConnection>,
}

impl BookmarkRepository {
    /// Create a new bookmark repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a member's bookmark of a story.
    pub async fn find_by_member_and_story(
        &self,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<Option<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::MemberId.eq(member_id))
            .filter(bookmark::Column::StoryId.eq(story_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a member has bookmarked a story.
    pub async fn exists(&self, member_id: &str, story_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_member_and_story(member_id, story_id)
            .await?
            .is_some())
    }

    /// Create a new bookmark.
    pub async fn create(&self, model: bookmark::ActiveModel) -> AppResult<bookmark::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a member's bookmark of a story.
    pub async fn delete_by_member_and_story(
        &self,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<bool> {
        let bookmark = self.find_by_member_and_story(member_id, story_id).await?;
        if let Some(b) = bookmark {
            b.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(true);
        }
        Ok(false)
    }

    /// A member's bookmarks, newest first.
    pub async fn find_by_member(
        &self,
        member_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<bookmark::Model>> {
        Bookmark::find()
            .filter(bookmark::Column::MemberId.eq(member_id))
            .order_by_desc(bookmark::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a member's bookmarks.
    pub async fn count_by_member(&self, member_id: &str) -> AppResult<u64> {
        Bookmark::find()
            .filter(bookmark::Column::MemberId.eq(member_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
