//! Rating service keeping the per-story aggregate consistent.
//!
//! A rating write and its aggregate adjustment commit in one
//! transaction with the aggregate row locked. Conflicting concurrent
//! writes retry once before the error surfaces.

use chrono::Utc;
use fabula_common::{AppError, AppResult, id::IdGenerator};
use fabula_db::entities::story_rating_aggregate::{RatingHistogram, mean_of};
use fabula_db::entities::{member_story_rating, story_rating_aggregate};
use fabula_db::repositories::{RatingRepository, StoryRepository};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{info, warn};

use super::cache::CacheService;
use super::settings::SettingsService;

/// Lowest accepted star value.
const MIN_RATING: i32 = 1;

/// Highest accepted star value.
const MAX_RATING: i32 = 5;

/// Maximum comment length in characters.
const MAX_COMMENT_LENGTH: usize = 2048;

/// Composite quality score in `[0, 100]`.
///
/// Rating quality carries 70 points and rating volume 30, saturating at
/// 50 ratings. Rounded to 1 decimal.
#[must_use]
#[allow(clippy::cast_precision_loss)] // counts stay far below 2^52
pub fn quality_score(mean: f64, total: i64) -> f64 {
    let rating_part = (mean / 5.0) * 70.0;
    let volume_part = ((total as f64 / 50.0) * 30.0).min(30.0);
    ((rating_part + volume_part) * 10.0).round() / 10.0
}

/// New `(total, sum, histogram)` after inserting or replacing a rating.
fn apply_rating(
    aggregate: Option<&story_rating_aggregate::Model>,
    previous: Option<i32>,
    rating: i32,
) -> (i64, i64, RatingHistogram) {
    let (mut total, mut sum, mut histogram) = match aggregate {
        Some(a) => (a.total_count, a.rating_sum, a.parsed_histogram()),
        None => (0, 0, RatingHistogram::default()),
    };

    match previous {
        Some(old) => {
            sum += i64::from(rating) - i64::from(old);
            histogram.decrement(old);
            histogram.increment(rating);
        }
        None => {
            total += 1;
            sum += i64::from(rating);
            histogram.increment(rating);
        }
    }

    (total, sum, histogram)
}

/// New `(total, sum, histogram)` after removing a rating.
fn apply_removal(
    aggregate: Option<&story_rating_aggregate::Model>,
    removed: i32,
) -> (i64, i64, RatingHistogram) {
    let (total, sum, mut histogram) = match aggregate {
        Some(a) => (a.total_count, a.rating_sum, a.parsed_histogram()),
        None => (0, 0, RatingHistogram::default()),
    };

    histogram.decrement(removed);
    ((total - 1).max(0), (sum - i64::from(removed)).max(0), histogram)
}

/// Histogram rebuilt from grouped `(star, count)` rows.
fn histogram_from_counts(counts: &[(i32, i64)]) -> RatingHistogram {
    let mut histogram = RatingHistogram::default();
    for &(star, count) in counts {
        match star {
            1 => histogram.one = count,
            2 => histogram.two = count,
            3 => histogram.three = count,
            4 => histogram.four = count,
            5 => histogram.five = count,
            _ => {}
        }
    }
    histogram
}

/// Transaction errors that are safe to retry once.
fn is_retryable_conflict(err: &AppError) -> bool {
    match err {
        AppError::Database(msg) => {
            msg.contains("could not serialize access")
                || msg.contains("deadlock detected")
                || msg.contains("duplicate key value")
                || msg.contains("40001")
                || msg.contains("40P01")
        }
        _ => false,
    }
}

/// Service for member ratings and the per-story aggregate.
#[derive(Clone)]
pub struct RatingService {
    db: Arc<DatabaseConnection>,
    rating_repo: RatingRepository,
    story_repo: StoryRepository,
    settings: SettingsService,
    cache: CacheService,
    id_gen: IdGenerator,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        rating_repo: RatingRepository,
        story_repo: StoryRepository,
        settings: SettingsService,
        cache: CacheService,
    ) -> Self {
        Self {
            db,
            rating_repo,
            story_repo,
            settings,
            cache,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store or replace a member's rating of a story.
    ///
    /// The story must be effectively published. Replacing keeps the
    /// total count and moves the histogram mass.
    pub async fn rate(
        &self,
        story_id: &str,
        member_id: &str,
        rating: i32,
        comment: Option<String>,
    ) -> AppResult<story_rating_aggregate::Model> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        if let Some(c) = &comment {
            if c.chars().count() > MAX_COMMENT_LENGTH {
                return Err(AppError::Validation("comment is too long".to_string()));
            }
        }

        if !self.settings.get().await?.ratings_enabled {
            return Err(AppError::Forbidden("ratings are disabled".to_string()));
        }

        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;
        if !story.is_effectively_published(Utc::now()) {
            return Err(AppError::Validation("story is not published".to_string()));
        }

        let result = match self
            .try_rate(story_id, member_id, rating, comment.clone())
            .await
        {
            Err(e) if is_retryable_conflict(&e) => {
                warn!(story_id = %story_id, member_id = %member_id, error = %e, "Retrying rating write after conflict");
                self.try_rate(story_id, member_id, rating, comment).await
            }
            other => other,
        }?;

        self.cache.invalidate_story(story_id).await;
        info!(story_id = %story_id, member_id = %member_id, rating = rating, "Stored rating");
        Ok(result)
    }

    /// Remove a member's rating of a story.
    pub async fn remove_rating(
        &self,
        story_id: &str,
        member_id: &str,
    ) -> AppResult<story_rating_aggregate::Model> {
        let result = match self.try_remove(story_id, member_id).await {
            Err(e) if is_retryable_conflict(&e) => {
                warn!(story_id = %story_id, member_id = %member_id, error = %e, "Retrying rating removal after conflict");
                self.try_remove(story_id, member_id).await
            }
            other => other,
        }?;

        self.cache.invalidate_story(story_id).await;
        info!(story_id = %story_id, member_id = %member_id, "Removed rating");
        Ok(result)
    }

    /// Rebuild a story's aggregate from its rating rows.
    pub async fn recompute_from_scratch(
        &self,
        story_id: &str,
    ) -> AppResult<story_rating_aggregate::Model> {
        self.story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let aggregate = self
            .rating_repo
            .find_aggregate_for_update(&txn, story_id)
            .await?;
        let counts = self.rating_repo.star_counts_on(&txn, story_id).await?;

        let histogram = histogram_from_counts(&counts);
        let total = histogram.total();
        let sum = histogram.weighted_sum();

        let updated = self
            .store_aggregate(&txn, story_id, aggregate.is_some(), total, sum, histogram)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.cache.invalidate_story(story_id).await;
        info!(story_id = %story_id, total = total, "Recomputed rating aggregate");
        Ok(updated)
    }

    /// A story's ratings with comments, newest first.
    pub async fn list_by_story(
        &self,
        story_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<member_story_rating::Model>> {
        self.rating_repo.find_by_story(story_id, limit, offset).await
    }

    /// Count a story's ratings.
    pub async fn count_by_story(&self, story_id: &str) -> AppResult<u64> {
        self.rating_repo.count_by_story(story_id).await
    }

    /// A member's own rating of a story.
    pub async fn find_member_rating(
        &self,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<Option<member_story_rating::Model>> {
        self.rating_repo
            .find_by_member_and_story(member_id, story_id)
            .await
    }

    /// A story's aggregate snapshot.
    pub async fn get_aggregate(
        &self,
        story_id: &str,
    ) -> AppResult<Option<story_rating_aggregate::Model>> {
        self.rating_repo.find_aggregate(story_id).await
    }

    async fn try_rate(
        &self,
        story_id: &str,
        member_id: &str,
        rating: i32,
        comment: Option<String>,
    ) -> AppResult<story_rating_aggregate::Model> {
        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let aggregate = self
            .rating_repo
            .find_aggregate_for_update(&txn, story_id)
            .await?;
        let existing = self
            .rating_repo
            .find_by_member_and_story_on(&txn, member_id, story_id)
            .await?;

        let previous = existing.as_ref().map(|r| r.rating);
        let (total, sum, histogram) = apply_rating(aggregate.as_ref(), previous, rating);

        match existing {
            Some(row) => {
                let update = member_story_rating::ActiveModel {
                    id: Set(row.id),
                    rating: Set(rating),
                    comment: Set(comment),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                };
                self.rating_repo.update_on(&txn, update).await?;
            }
            None => {
                let insert = member_story_rating::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    member_id: Set(member_id.to_string()),
                    story_id: Set(story_id.to_string()),
                    rating: Set(rating),
                    comment: Set(comment),
                    created_at: Set(now),
                    updated_at: Set(None),
                };
                self.rating_repo.insert_on(&txn, insert).await?;
            }
        }

        let updated = self
            .store_aggregate(&txn, story_id, aggregate.is_some(), total, sum, histogram)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(updated)
    }

    async fn try_remove(
        &self,
        story_id: &str,
        member_id: &str,
    ) -> AppResult<story_rating_aggregate::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let aggregate = self
            .rating_repo
            .find_aggregate_for_update(&txn, story_id)
            .await?;
        let existing = self
            .rating_repo
            .find_by_member_and_story_on(&txn, member_id, story_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no rating for story {story_id}")))?;

        let (total, sum, histogram) = apply_removal(aggregate.as_ref(), existing.rating);

        self.rating_repo.delete_on(&txn, existing).await?;

        let updated = self
            .store_aggregate(&txn, story_id, aggregate.is_some(), total, sum, histogram)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(updated)
    }

    /// Insert or overwrite the aggregate row on the caller's transaction.
    async fn store_aggregate<C: ConnectionTrait>(
        &self,
        conn: &C,
        story_id: &str,
        exists: bool,
        total: i64,
        sum: i64,
        histogram: RatingHistogram,
    ) -> AppResult<story_rating_aggregate::Model> {
        let now = Utc::now();
        let mean = mean_of(sum, total);

        if exists {
            let update = story_rating_aggregate::ActiveModel {
                story_id: Set(story_id.to_string()),
                total_count: Set(total),
                rating_sum: Set(sum),
                mean: Set(mean),
                histogram: Set(histogram.to_json()),
                updated_at: Set(Some(now)),
                ..Default::default()
            };
            self.rating_repo.update_aggregate_on(conn, update).await
        } else {
            let insert = story_rating_aggregate::ActiveModel {
                story_id: Set(story_id.to_string()),
                total_count: Set(total),
                rating_sum: Set(sum),
                mean: Set(mean),
                histogram: Set(histogram.to_json()),
                created_at: Set(now),
                updated_at: Set(None),
            };
            self.rating_repo.insert_aggregate_on(conn, insert).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabula_common::PublishingConfig;
    use fabula_db::entities::{app_settings, story};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn settings_row(ratings_enabled: bool) -> app_settings::Model {
        app_settings::Model {
            id: app_settings::APP_SETTINGS_ID.to_string(),
            story_cache_ttl_seconds: 300,
            dashboard_cache_ttl_seconds: 600,
            default_active_days: 30,
            expiring_soon_window_hours: 48,
            registration_enabled: true,
            ratings_enabled,
            bookmarks_enabled: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn published_story(id: &str) -> story::Model {
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
            active: true,
            active_from: None,
            active_until: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn aggregate_row(story_id: &str, total: i64, sum: i64, histogram: RatingHistogram) -> story_rating_aggregate::Model {
        story_rating_aggregate::Model {
            story_id: story_id.to_string(),
            total_count: total,
            rating_sum: sum,
            mean: mean_of(sum, total),
            histogram: histogram.to_json(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn rating_row(id: &str, story_id: &str, rating: i32) -> member_story_rating::Model {
        member_story_rating::Model {
            id: id.to_string(),
            member_id: "m1".to_string(),
            story_id: story_id.to_string(),
            rating,
            comment: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> RatingService {
        RatingService::new(
            db.clone(),
            RatingRepository::new(db.clone()),
            StoryRepository::new(db.clone()),
            SettingsService::new(db, &PublishingConfig::default()),
            CacheService::disabled(),
        )
    }

    #[tokio::test]
    async fn test_rate_rejects_out_of_range() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);

        let low = svc.rate("s1", "m1", 0, None).await;
        assert!(matches!(low, Err(AppError::Validation(_))));

        let high = svc.rate("s1", "m1", 6, None).await;
        assert!(matches!(high, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rate_rejects_unpublished_story() {
        let mut draft = published_story("s1");
        draft.active = false;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[settings_row(true)]])
                .append_query_results([[draft]])
                .into_connection(),
        );

        let result = service(db).rate("s1", "m1", 4, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rate_forbidden_when_disabled() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[settings_row(false)]])
                .into_connection(),
        );

        let result = service(db).rate("s1", "m1", 4, None).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_first_rating_creates_aggregate() {
        let mut histogram = RatingHistogram::default();
        histogram.increment(4);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[settings_row(true)]])
                .append_query_results([[published_story("s1")]])
                .append_query_results([Vec::<story_rating_aggregate::Model>::new()])
                .append_query_results([Vec::<member_story_rating::Model>::new()])
                .append_query_results([[rating_row("r1", "s1", 4)]])
                .append_query_results([[aggregate_row("s1", 1, 4, histogram)]])
                .into_connection(),
        );

        let result = service(db).rate("s1", "m1", 4, None).await.unwrap();
        assert_eq!(result.total_count, 1);
        assert!(result.is_consistent());
    }

    #[tokio::test]
    async fn test_remove_missing_rating_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<story_rating_aggregate::Model>::new()])
                .append_query_results([Vec::<member_story_rating::Model>::new()])
                .into_connection(),
        );

        let result = service(db).remove_rating("s1", "m1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_replace_moves_histogram_mass() {
        let mut histogram = RatingHistogram::default();
        histogram.increment(3);
        let aggregate = aggregate_row("s1", 1, 3, histogram);

        let (total, sum, updated) = apply_rating(Some(&aggregate), Some(3), 5);

        assert_eq!(total, 1);
        assert_eq!(sum, 5);
        assert_eq!(updated.get(3), 0);
        assert_eq!(updated.get(5), 1);
        assert!((mean_of(sum, total) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_rating_math() {
        let (total, sum, histogram) = apply_rating(None, None, 4);

        assert_eq!(total, 1);
        assert_eq!(sum, 4);
        assert_eq!(histogram.get(4), 1);
    }

    #[test]
    fn test_removal_math_reaches_zero() {
        let mut histogram = RatingHistogram::default();
        histogram.increment(4);
        let aggregate = aggregate_row("s1", 1, 4, histogram);

        let (total, sum, updated) = apply_removal(Some(&aggregate), 4);

        assert_eq!(total, 0);
        assert_eq!(sum, 0);
        assert_eq!(updated.total(), 0);
        assert!((mean_of(sum, total) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_histogram_from_counts() {
        let histogram = histogram_from_counts(&[(4, 2), (5, 1)]);

        assert_eq!(histogram.total(), 3);
        assert_eq!(histogram.weighted_sum(), 13);
    }

    #[test]
    fn test_quality_score_saturates_at_fifty_ratings() {
        assert!((quality_score(5.0, 50) - 100.0).abs() < f64::EPSILON);
        assert!((quality_score(5.0, 100) - 100.0).abs() < f64::EPSILON);
        assert!((quality_score(0.0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((quality_score(4.0, 25) - 71.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retryable_conflict_detection() {
        assert!(is_retryable_conflict(&AppError::Database(
            "could not serialize access due to concurrent update".to_string()
        )));
        assert!(is_retryable_conflict(&AppError::Database(
            "deadlock detected".to_string()
        )));
        assert!(!is_retryable_conflict(&AppError::Database(
            "syntax error at or near".to_string()
        )));
        assert!(!is_retryable_conflict(&AppError::Validation(
            "rating must be between 1 and 5".to_string()
        )));
    }
}
