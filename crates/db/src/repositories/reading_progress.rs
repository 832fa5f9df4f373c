//! Reading progress repository.

use std::sync::Arc;

use crate::entities::{ReadingProgress, reading_progress};
use fabula_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Reading progress repository for database operations.
#[derive(Clone)]
pub struct ReadingProgressRepository {
    db: Arc<DatabaseConnection>,
}

impl ReadingProgressRepository {
    /// Create a new reading progress repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a member's progress on a story.
    pub async fn find_by_member_and_story(
        &self,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<Option<reading_progress::Model>> {
        ReadingProgress::find()
            .filter(reading_progress::Column::MemberId.eq(member_id))
            .filter(reading_progress::Column::StoryId.eq(story_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new progress row.
    pub async fn create(
        &self,
        model: reading_progress::ActiveModel,
    ) -> AppResult<reading_progress::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a progress row.
    pub async fn update(
        &self,
        model: reading_progress::ActiveModel,
    ) -> AppResult<reading_progress::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A member's progress rows, most recently read first.
    pub async fn find_by_member(
        &self,
        member_id: &str,
        limit: u64,
    ) -> AppResult<Vec<reading_progress::Model>> {
        ReadingProgress::find()
            .filter(reading_progress::Column::MemberId.eq(member_id))
            .order_by_desc(reading_progress::Column::LastReadAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A member's unfinished stories, most recently read first.
    pub async fn find_in_progress_by_member(
        &self,
        member_id: &str,
        limit: u64,
    ) -> AppResult<Vec<reading_progress::Model>> {
        ReadingProgress::find()
            .filter(reading_progress::Column::MemberId.eq(member_id))
            .filter(reading_progress::Column::Percent.lt(100))
            .order_by_desc(reading_progress::Column::LastReadAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
