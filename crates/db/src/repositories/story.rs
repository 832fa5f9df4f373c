//! Story repository.

use std::sync::Arc;

use crate::entities::{Story, StoryRatingAggregate, story, story_rating_aggregate};
use chrono::{DateTime, Utc};
use fabula_common::{AppError, AppResult};
use sea_orm::sea_query::{Alias, Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Story repository for database operations.
///
/// Lifecycle writes go through the `*_on` methods so the publishing service
/// can run them inside its own transaction with the story row locked.
#[derive(Clone)]
pub struct StoryRepository {
    db: Arc<DatabaseConnection>,
}

/// Filter for stories whose publication window covers `now`.
fn published_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(story::Column::Active.eq(true))
        .add(
            Condition::any()
                .add(story::Column::ActiveFrom.is_null())
                .add(story::Column::ActiveFrom.lte(now)),
        )
        .add(
            Condition::any()
                .add(story::Column::ActiveUntil.is_null())
                .add(story::Column::ActiveUntil.gte(now)),
        )
}

impl StoryRepository {
    /// Create a new story repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a story by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story by ID with a `FOR UPDATE` row lock.
    ///
    /// Must run on a transaction; the lock is released at commit/rollback.
    pub async fn find_by_id_for_update<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<Option<story::Model>> {
        Story::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find stories by ID, in no particular order.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<story::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Story::find()
            .filter(story::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<story::Model>> {
        Story::find()
            .filter(story::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new story.
    pub async fn create(&self, model: story::ActiveModel) -> AppResult<story::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a story.
    pub async fn update(&self, model: story::ActiveModel) -> AppResult<story::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a story on the given connection, typically a transaction.
    pub async fn update_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: story::ActiveModel,
    ) -> AppResult<story::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a story.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let story = self.find_by_id(id).await?;
        if let Some(s) = story {
            s.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Atomically bump the view counter.
    pub async fn increment_view_count(&self, id: &str) -> AppResult<()> {
        Story::update_many()
            .col_expr(
                story::Column::ViewCount,
                Expr::col(story::Column::ViewCount).add(1),
            )
            .filter(story::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List stories visible to readers at `now`, newest first.
    pub async fn find_published(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(published_condition(now))
            .order_by_desc(story::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List published stories in a category, newest first.
    pub async fn find_published_by_category(
        &self,
        category_id: &str,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(published_condition(now))
            .filter(story::Column::CategoryId.eq(category_id))
            .order_by_desc(story::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List published stories with their rating aggregate, best mean first.
    pub async fn find_top_rated(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<(story::Model, Option<story_rating_aggregate::Model>)>> {
        Story::find()
            .find_also_related(StoryRatingAggregate)
            .filter(published_condition(now))
            .order_by_with_nulls(
                story_rating_aggregate::Column::Mean,
                Order::Desc,
                NullOrdering::Last,
            )
            .order_by_with_nulls(
                story_rating_aggregate::Column::TotalCount,
                Order::Desc,
                NullOrdering::Last,
            )
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List published stories by view count, most viewed first.
    pub async fn find_most_viewed(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(published_condition(now))
            .order_by_desc(story::Column::ViewCount)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List an author's stories, newest first.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(story::Column::AuthorId.eq(author_id))
            .order_by_desc(story::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all stories for the admin panel, newest first.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<story::Model>> {
        Story::find()
            .order_by_desc(story::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active stories whose window ends inside `[from, to]`, soonest first.
    pub async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(story::Column::Active.eq(true))
            .filter(story::Column::ActiveUntil.gte(from))
            .filter(story::Column::ActiveUntil.lte(to))
            .order_by_asc(story::Column::ActiveUntil)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active stories whose window already ended at `now`.
    pub async fn find_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<story::Model>> {
        Story::find()
            .filter(story::Column::Active.eq(true))
            .filter(story::Column::ActiveUntil.lt(now))
            .order_by_asc(story::Column::ActiveUntil)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count stories in a category, drafts included.
    pub async fn count_by_category(&self, category_id: &str) -> AppResult<u64> {
        Story::find()
            .filter(story::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all stories.
    pub async fn count(&self) -> AppResult<u64> {
        Story::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count stories visible to readers at `now`.
    pub async fn count_published_at(&self, now: DateTime<Utc>) -> AppResult<u64> {
        Story::find()
            .filter(published_condition(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of all view counters.
    pub async fn sum_views(&self) -> AppResult<i64> {
        // SUM(bigint) comes back as numeric on Postgres, so cast it down.
        let total: Option<Option<i64>> = Story::find()
            .select_only()
            .column_as(
                story::Column::ViewCount.sum().cast_as(Alias::new("BIGINT")),
                "total",
            )
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(total.flatten().unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_story(id: &str, active: bool) -> story::Model {
        story::Model {
            id: id.to_string(),
            author_id: "m1".to_string(),
            category_id: "c1".to_string(),
            title: format!("Story {id}"),
            slug: format!("story-{id}"),
            summary: None,
            body: "Once upon a time".to_string(),
            cover_image_url: None,
            view_count: 0,
            reading_time_minutes: 1,
            active,
            active_from: None,
            active_until: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let story = create_test_story("s1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story.clone()]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_by_id("s1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().slug, "story-s1");
    }

    #[tokio::test]
    async fn test_find_by_slug_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story::Model>::new()])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_by_slug("missing").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        repo.increment_view_count("s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_find_expiring_between() {
        let now = Utc::now();
        let mut story = create_test_story("s1", true);
        story.active_until = Some(now + Duration::hours(2));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[story]])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo
            .find_expiring_between(now, now + Duration::hours(3), 50)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_find_expired_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story::Model>::new()])
                .into_connection(),
        );

        let repo = StoryRepository::new(db);
        let result = repo.find_expired(Utc::now()).await.unwrap();

        assert!(result.is_empty());
    }
}
