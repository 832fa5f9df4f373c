//! Tag repository.

use std::sync::Arc;

use crate::entities::{StoryTag, Tag, story_tag, tag};
use fabula_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tag by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tag::Model>> {
        Tag::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by its lowercase name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new tag.
    pub async fn create(&self, model: tag::ActiveModel) -> AppResult<tag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List tags, most used first.
    pub async fn find_all(&self, limit: u64) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_desc(tag::Column::UsageCount)
            .order_by_asc(tag::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tags attached to a story.
    pub async fn find_by_story(&self, story_id: &str) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .join(JoinType::InnerJoin, tag::Relation::StoryTags.def())
            .filter(story_tag::Column::StoryId.eq(story_id))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an attachment row.
    pub async fn find_attachment(
        &self,
        story_id: &str,
        tag_id: &str,
    ) -> AppResult<Option<story_tag::Model>> {
        StoryTag::find()
            .filter(story_tag::Column::StoryId.eq(story_id))
            .filter(story_tag::Column::TagId.eq(tag_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attach a tag to a story.
    pub async fn attach(&self, model: story_tag::ActiveModel) -> AppResult<story_tag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Detach a tag from a story. Returns whether a row was removed.
    pub async fn detach(&self, story_id: &str, tag_id: &str) -> AppResult<bool> {
        let attachment = self.find_attachment(story_id, tag_id).await?;
        if let Some(a) = attachment {
            a.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Atomically bump a tag's usage counter.
    pub async fn increment_usage(&self, tag_id: &str) -> AppResult<()> {
        Tag::update_many()
            .col_expr(
                tag::Column::UsageCount,
                Expr::col(tag::Column::UsageCount).add(1),
            )
            .filter(tag::Column::Id.eq(tag_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically drop a tag's usage counter, never below zero.
    pub async fn decrement_usage(&self, tag_id: &str) -> AppResult<()> {
        Tag::update_many()
            .col_expr(
                tag::Column::UsageCount,
                Expr::col(tag::Column::UsageCount).sub(1),
            )
            .filter(tag::Column::Id.eq(tag_id))
            .filter(tag::Column::UsageCount.gt(0))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_tag(id: &str, name: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            usage_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let tag = create_test_tag("t1", "adventure");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tag]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let result = repo.find_by_name("adventure").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_detach_missing_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story_tag::Model>::new()])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let detached = repo.detach("s1", "t1").await.unwrap();

        assert!(!detached);
    }

    #[tokio::test]
    async fn test_increment_usage() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        repo.increment_usage("t1").await.unwrap();
    }
}
