//! Rating repository.
//!
//! Covers both `member_story_rating` rows and the denormalized
//! `story_rating_aggregate`. The two are one consistency unit: every write
//! path touches them inside a single transaction, with the aggregate row as
//! the lock point.

use std::sync::Arc;

use crate::entities::{
    MemberStoryRating, StoryRatingAggregate, member_story_rating, story_rating_aggregate,
};
use fabula_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a member's rating of a story.
    pub async fn find_by_member_and_story(
        &self,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<Option<member_story_rating::Model>> {
        MemberStoryRating::find()
            .filter(member_story_rating::Column::MemberId.eq(member_id))
            .filter(member_story_rating::Column::StoryId.eq(story_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member's rating of a story on the given connection.
    pub async fn find_by_member_and_story_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<Option<member_story_rating::Model>> {
        MemberStoryRating::find()
            .filter(member_story_rating::Column::MemberId.eq(member_id))
            .filter(member_story_rating::Column::StoryId.eq(story_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a rating row on the given connection.
    pub async fn insert_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member_story_rating::ActiveModel,
    ) -> AppResult<member_story_rating::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a rating row on the given connection.
    pub async fn update_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member_story_rating::ActiveModel,
    ) -> AppResult<member_story_rating::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a rating row on the given connection.
    pub async fn delete_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member_story_rating::Model,
    ) -> AppResult<()> {
        model
            .delete(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// A story's ratings, newest first.
    pub async fn find_by_story(
        &self,
        story_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<member_story_rating::Model>> {
        MemberStoryRating::find()
            .filter(member_story_rating::Column::StoryId.eq(story_id))
            .order_by_desc(member_story_rating::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a story's ratings.
    pub async fn count_by_story(&self, story_id: &str) -> AppResult<u64> {
        MemberStoryRating::find()
            .filter(member_story_rating::Column::StoryId.eq(story_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all ratings.
    pub async fn count(&self) -> AppResult<u64> {
        MemberStoryRating::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Per-star counts for a story, `(star, count)` rows.
    ///
    /// Ground truth for rebuilding the aggregate from the rating rows.
    pub async fn star_counts_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        story_id: &str,
    ) -> AppResult<Vec<(i32, i64)>> {
        MemberStoryRating::find()
            .select_only()
            .column(member_story_rating::Column::Rating)
            .column_as(member_story_rating::Column::Rating.count(), "cnt")
            .filter(member_story_rating::Column::StoryId.eq(story_id))
            .group_by(member_story_rating::Column::Rating)
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story's aggregate.
    pub async fn find_aggregate(
        &self,
        story_id: &str,
    ) -> AppResult<Option<story_rating_aggregate::Model>> {
        StoryRatingAggregate::find_by_id(story_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a story's aggregate with a `FOR UPDATE` row lock.
    ///
    /// Must run on a transaction; this is the serialization point for all
    /// concurrent rating writes against the same story.
    pub async fn find_aggregate_for_update<C: ConnectionTrait>(
        &self,
        conn: &C,
        story_id: &str,
    ) -> AppResult<Option<story_rating_aggregate::Model>> {
        StoryRatingAggregate::find_by_id(story_id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an aggregate row on the given connection.
    pub async fn insert_aggregate_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: story_rating_aggregate::ActiveModel,
    ) -> AppResult<story_rating_aggregate::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an aggregate row on the given connection.
    pub async fn update_aggregate_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: story_rating_aggregate::ActiveModel,
    ) -> AppResult<story_rating_aggregate::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Aggregates for a set of stories, for enriching listings.
    pub async fn find_aggregates(
        &self,
        story_ids: &[String],
    ) -> AppResult<Vec<story_rating_aggregate::Model>> {
        if story_ids.is_empty() {
            return Ok(Vec::new());
        }
        StoryRatingAggregate::find()
            .filter(story_rating_aggregate::Column::StoryId.is_in(story_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::story_rating_aggregate::RatingHistogram;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_rating(id: &str, member_id: &str, story_id: &str, rating: i32) -> member_story_rating::Model {
        member_story_rating::Model {
            id: id.to_string(),
            member_id: member_id.to_string(),
            story_id: story_id.to_string(),
            rating,
            comment: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_member_and_story_found() {
        let rating = create_test_rating("r1", "m1", "s1", 4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[rating]])
                .into_connection(),
        );

        let repo = RatingRepository::new(db);
        let result = repo.find_by_member_and_story("m1", "s1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().rating, 4);
    }

    #[tokio::test]
    async fn test_find_aggregate_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story_rating_aggregate::Model>::new()])
                .into_connection(),
        );

        let repo = RatingRepository::new(db);
        let result = repo.find_aggregate("s1").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_aggregates_empty_input_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = RatingRepository::new(db);
        let result = repo.find_aggregates(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_star_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // MockRow tuples decode by position over keys in alphabetical
                // order, so the keys are prefixed to keep (rating, cnt) order.
                .append_query_results([vec![
                    maplit::btreemap! {
                        "a_rating" => sea_orm::Value::Int(Some(3)),
                        "b_cnt" => sea_orm::Value::BigInt(Some(2)),
                    },
                    maplit::btreemap! {
                        "a_rating" => sea_orm::Value::Int(Some(5)),
                        "b_cnt" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let repo = RatingRepository::new(db.clone());
        let counts = repo.star_counts_on(db.as_ref(), "s1").await.unwrap();

        assert_eq!(counts, vec![(3, 2), (5, 1)]);
    }

    #[tokio::test]
    async fn test_aggregate_model_consistency_helper() {
        let mut histogram = RatingHistogram::default();
        histogram.increment(4);

        let model = story_rating_aggregate::Model {
            story_id: "s1".to_string(),
            total_count: 1,
            rating_sum: 4,
            mean: 4.0,
            histogram: histogram.to_json(),
            created_at: Utc::now(),
            updated_at: None,
        };

        assert!(model.is_consistent());
    }
}
