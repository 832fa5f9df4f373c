//! Story service.
//!
//! Owns story content: creation, editing, deletion, and the reader-facing
//! detail and listing views. Lifecycle fields (`active`, `active_from`,
//! `active_until`) are never touched here; those belong to the publishing
//! service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fabula_common::{id::IdGenerator, AppError, AppResult};
use fabula_db::entities::{member, story, story_rating_aggregate};
use fabula_db::repositories::{CategoryRepository, RatingRepository, StoryRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::cache::CacheService;
use super::publishing::can_update;
use super::rating::quality_score;
use super::settings::SettingsService;

/// Page size served by the default listing endpoints and stored in the cache.
const DEFAULT_PAGE_SIZE: u64 = 20;

/// Assumed reading speed for the reading-time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Input for creating a story.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoryInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Explicit slug. Derived from the title when absent.
    #[validate(length(min = 1, max = 128))]
    pub slug: Option<String>,
    #[validate(length(max = 1024))]
    pub summary: Option<String>,
    #[validate(length(min = 1))]
    pub body: String,
    pub category_id: String,
    #[validate(length(max = 2048))]
    pub cover_image_url: Option<String>,
}

/// Input for updating story content. The slug is immutable.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateStoryInput {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(max = 1024))]
    pub summary: Option<Option<String>>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub category_id: Option<String>,
    #[validate(length(max = 2048))]
    pub cover_image_url: Option<Option<String>>,
}

/// Rating summary attached to detail and listing responses.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub mean: f64,
    pub total_count: i64,
    pub quality_score: f64,
}

impl RatingSnapshot {
    #[must_use]
    pub fn from_aggregate(aggregate: Option<&story_rating_aggregate::Model>) -> Self {
        aggregate.map_or_else(Self::default, |a| Self {
            mean: a.mean,
            total_count: a.total_count,
            quality_score: quality_score(a.mean, a.total_count),
        })
    }
}

/// Full story detail served to readers. Cached per story ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryDetail {
    pub story: story::Model,
    pub category_name: Option<String>,
    pub rating: RatingSnapshot,
}

/// Slim listing entry. Carries no body text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryListItem {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub cover_image_url: Option<String>,
    pub category_id: String,
    pub view_count: i64,
    pub reading_time_minutes: i32,
    pub active_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub rating: RatingSnapshot,
}

fn list_item(
    story: story::Model,
    aggregate: Option<&story_rating_aggregate::Model>,
) -> StoryListItem {
    StoryListItem {
        rating: RatingSnapshot::from_aggregate(aggregate),
        id: story.id,
        title: story.title,
        slug: story.slug,
        summary: story.summary,
        cover_image_url: story.cover_image_url,
        category_id: story.category_id,
        view_count: story.view_count,
        reading_time_minutes: story.reading_time_minutes,
        active_until: story.active_until,
        created_at: story.created_at,
    }
}

/// Estimated minutes to read `body`, never below one.
#[must_use]
pub fn reading_time_minutes(body: &str) -> i32 {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Derive a URL-safe slug from a title. Non-ASCII characters are dropped.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Service for story content and discovery.
#[derive(Clone)]
pub struct StoryService {
    story_repo: StoryRepository,
    category_repo: CategoryRepository,
    rating_repo: RatingRepository,
    settings: SettingsService,
    cache: CacheService,
    id_gen: IdGenerator,
}

impl StoryService {
    /// Create a new story service.
    #[must_use]
    pub const fn new(
        story_repo: StoryRepository,
        category_repo: CategoryRepository,
        rating_repo: RatingRepository,
        settings: SettingsService,
        cache: CacheService,
    ) -> Self {
        Self {
            story_repo,
            category_repo,
            rating_repo,
            settings,
            cache,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new story. The story starts as a draft.
    pub async fn create(
        &self,
        author: &member::Model,
        input: CreateStoryInput,
    ) -> AppResult<story::Model> {
        input.validate()?;

        if !author.is_admin {
            return Err(AppError::Forbidden("only admins can create stories".to_string()));
        }

        let slug = input.slug.unwrap_or_else(|| slugify(&input.title));
        if !is_valid_slug(&slug) {
            return Err(AppError::Validation(
                "slug may contain only lowercase letters, digits, and dashes".to_string(),
            ));
        }

        self.require_active_category(&input.category_id).await?;

        if self.story_repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!("slug {slug} is already in use")));
        }

        let now = Utc::now();
        let model = story::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author.id.clone()),
            category_id: Set(input.category_id),
            title: Set(input.title),
            slug: Set(slug),
            summary: Set(input.summary),
            reading_time_minutes: Set(reading_time_minutes(&input.body)),
            body: Set(input.body),
            cover_image_url: Set(input.cover_image_url),
            view_count: Set(0),
            active: Set(false),
            active_from: Set(None),
            active_until: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let story = self.story_repo.create(model).await?;
        info!(story_id = %story.id, slug = %story.slug, "Created story");
        Ok(story)
    }

    /// Update story content. Lifecycle fields are left untouched.
    pub async fn update(
        &self,
        story_id: &str,
        actor: &member::Model,
        input: UpdateStoryInput,
    ) -> AppResult<story::Model> {
        input.validate()?;

        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        if !can_update(actor, &story) {
            return Err(AppError::Forbidden("cannot modify this story".to_string()));
        }

        if let Some(ref category_id) = input.category_id {
            self.require_active_category(category_id).await?;
        }

        let mut active: story::ActiveModel = story.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(summary) = input.summary {
            active.summary = Set(summary);
        }
        if let Some(body) = input.body {
            active.reading_time_minutes = Set(reading_time_minutes(&body));
            active.body = Set(body);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(cover_image_url) = input.cover_image_url {
            active.cover_image_url = Set(cover_image_url);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = self.story_repo.update(active).await?;
        self.cache.invalidate_story(&updated.id).await;
        info!(story_id = %updated.id, "Updated story content");
        Ok(updated)
    }

    /// Delete a story and everything hanging off it.
    pub async fn delete(&self, story_id: &str, actor: &member::Model) -> AppResult<()> {
        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        if !can_update(actor, &story) {
            return Err(AppError::Forbidden("cannot modify this story".to_string()));
        }

        self.story_repo.delete(story_id).await?;
        self.cache.invalidate_story(story_id).await;
        info!(story_id = %story_id, "Deleted story");
        Ok(())
    }

    /// Fetch a story for the admin editor. Drafts are visible here.
    pub async fn get_for_editor(
        &self,
        story_id: &str,
        actor: &member::Model,
    ) -> AppResult<story::Model> {
        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        if !can_update(actor, &story) {
            return Err(AppError::Forbidden("cannot modify this story".to_string()));
        }

        Ok(story)
    }

    /// Reader detail fetch by ID. Counts the view and hides unpublished stories.
    pub async fn get_published(&self, story_id: &str) -> AppResult<StoryDetail> {
        let key = self.cache.story_key(story_id);
        if let Some(detail) = self.cache.get_json::<StoryDetail>(&key).await {
            self.story_repo.increment_view_count(story_id).await?;
            return Ok(detail);
        }

        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        self.serve_published(story).await
    }

    /// Reader detail fetch by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<StoryDetail> {
        let story = self
            .story_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(slug.to_string()))?;

        self.serve_published(story).await
    }

    /// Published stories, newest first.
    pub async fn list_latest(&self, limit: u64, offset: u64) -> AppResult<Vec<StoryListItem>> {
        let cacheable = limit == DEFAULT_PAGE_SIZE && offset == 0;
        let key = self.cache.latest_stories_key();
        if cacheable {
            if let Some(items) = self.cache.get_json::<Vec<StoryListItem>>(&key).await {
                return Ok(items);
            }
        }

        let stories = self.story_repo.find_published(Utc::now(), limit, offset).await?;
        let items = self.attach_ratings(stories).await?;

        if cacheable {
            self.store_listing(&key, &items).await?;
        }
        Ok(items)
    }

    /// Published stories in one category, newest first. Never cached.
    pub async fn list_by_category(
        &self,
        category_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<StoryListItem>> {
        let stories = self
            .story_repo
            .find_published_by_category(category_id, Utc::now(), limit, offset)
            .await?;
        self.attach_ratings(stories).await
    }

    /// Published stories ranked by mean rating.
    pub async fn list_top_rated(&self, limit: u64) -> AppResult<Vec<StoryListItem>> {
        let cacheable = limit == DEFAULT_PAGE_SIZE;
        let key = self.cache.top_stories_key();
        if cacheable {
            if let Some(items) = self.cache.get_json::<Vec<StoryListItem>>(&key).await {
                return Ok(items);
            }
        }

        let pairs = self.story_repo.find_top_rated(Utc::now(), limit).await?;
        let items: Vec<StoryListItem> = pairs
            .into_iter()
            .map(|(story, aggregate)| list_item(story, aggregate.as_ref()))
            .collect();

        if cacheable {
            self.store_listing(&key, &items).await?;
        }
        Ok(items)
    }

    /// An author's own stories, drafts included.
    pub async fn list_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_by_author(author_id, limit, offset).await
    }

    /// Every story for the admin panel.
    pub async fn list_all(
        &self,
        actor: &member::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story::Model>> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("only admins can list all stories".to_string()));
        }
        self.story_repo.find_all(limit, offset).await
    }

    async fn require_active_category(&self, category_id: &str) -> AppResult<()> {
        let category = self
            .category_repo
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {category_id}")))?;
        if !category.is_active {
            return Err(AppError::Validation("category is not active".to_string()));
        }
        Ok(())
    }

    /// Assemble the reader detail, count the view, and cache the result.
    ///
    /// The returned snapshot does not include this fetch's own view.
    async fn serve_published(&self, story: story::Model) -> AppResult<StoryDetail> {
        if !story.is_effectively_published(Utc::now()) {
            return Err(AppError::StoryNotFound(story.id.clone()));
        }

        let aggregate = self.rating_repo.find_aggregate(&story.id).await?;
        let category = self.category_repo.find_by_id(&story.category_id).await?;
        self.story_repo.increment_view_count(&story.id).await?;

        let detail = StoryDetail {
            category_name: category.map(|c| c.name),
            rating: RatingSnapshot::from_aggregate(aggregate.as_ref()),
            story,
        };

        if self.cache.is_enabled() {
            let ttl = self.settings.get().await?.story_cache_ttl_seconds;
            let key = self.cache.story_key(&detail.story.id);
            self.cache.set_json(&key, &detail, ttl).await;
        }
        Ok(detail)
    }

    async fn attach_ratings(&self, stories: Vec<story::Model>) -> AppResult<Vec<StoryListItem>> {
        if stories.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = stories.iter().map(|s| s.id.clone()).collect();
        let aggregates: HashMap<String, story_rating_aggregate::Model> = self
            .rating_repo
            .find_aggregates(&ids)
            .await?
            .into_iter()
            .map(|a| (a.story_id.clone(), a))
            .collect();

        Ok(stories
            .into_iter()
            .map(|story| {
                let aggregate = aggregates.get(&story.id);
                list_item(story, aggregate)
            })
            .collect())
    }

    async fn store_listing(&self, key: &str, items: &[StoryListItem]) -> AppResult<()> {
        if self.cache.is_enabled() {
            let ttl = self.settings.get().await?.story_cache_ttl_seconds;
            self.cache.set_json(key, &items, ttl).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabula_common::config::PublishingConfig;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_member(id: &str, is_admin: bool) -> member::Model {
        member::Model {
            id: id.to_string(),
            username: format!("user-{id}"),
            email: format!("{id}@example.com"),
            password_hash: "hash".to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin,
            token: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn test_story(id: &str, author_id: &str, active: bool) -> story::Model {
        story::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            category_id: "c1".to_string(),
            title: format!("Story {id}"),
            slug: format!("story-{id}"),
            summary: None,
            body: "Once upon a time there was a story.".to_string(),
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

    fn test_category(id: &str, is_active: bool) -> fabula_db::entities::category::Model {
        fabula_db::entities::category::Model {
            id: id.to_string(),
            name: "Fiction".to_string(),
            slug: "fiction".to_string(),
            description: None,
            display_order: 0,
            is_active,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn aggregate_row(story_id: &str, total: i64, sum: i64) -> story_rating_aggregate::Model {
        let mut histogram = story_rating_aggregate::RatingHistogram::default();
        histogram.increment(4);
        story_rating_aggregate::Model {
            story_id: story_id.to_string(),
            total_count: total,
            rating_sum: sum,
            mean: story_rating_aggregate::mean_of(sum, total),
            histogram: histogram.to_json(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> StoryService {
        StoryService::new(
            StoryRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            RatingRepository::new(db.clone()),
            SettingsService::new(db, &PublishingConfig::default()),
            CacheService::disabled(),
        )
    }

    fn create_input(title: &str, slug: Option<&str>) -> CreateStoryInput {
        CreateStoryInput {
            title: title.to_string(),
            slug: slug.map(String::from),
            summary: None,
            body: "word ".repeat(450),
            category_id: "c1".to_string(),
            cover_image_url: None,
        }
    }

    #[test]
    fn test_reading_time_never_below_one_minute() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("just a few words"), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"word ".repeat(1000)), 5);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("The  Silent   Grove"), "the-silent-grove");
        assert_eq!(slugify("-- Weird -- Title --"), "weird-title");
        assert_eq!(slugify("Caf\u{e9} Stories"), "caf-stories");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slug_format_check() {
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("Uppercase"));
        assert!(!is_valid_slug("with space"));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let result = service
            .create(&test_member("m1", false), create_input("A Story", None))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_inactive_category() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_category("c1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let result = service
            .create(&test_member("m1", true), create_input("A Story", None))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_category("c1", true)]])
                .append_query_results([[test_story("existing", "m1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let result = service
            .create(&test_member("m1", true), create_input("A Story", Some("story-existing")))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_story() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_category("c1", true)]])
                .append_query_results([Vec::<story::Model>::new()])
                .append_query_results([[test_story("s1", "m1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let story = service
            .create(&test_member("m1", true), create_input("A Story", None))
            .await
            .unwrap();

        assert_eq!(story.id, "s1");
        assert!(!story.active);
    }

    #[tokio::test]
    async fn test_update_rejects_non_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let input = UpdateStoryInput {
            title: Some("New Title".to_string()),
            ..Default::default()
        };
        let result = service.update("s1", &test_member("m2", false), input).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_story_content() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1", false)]])
                .append_query_results([[test_story("s1", "m1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let input = UpdateStoryInput {
            title: Some("New Title".to_string()),
            body: Some("short body".to_string()),
            ..Default::default()
        };
        let result = service.update("s1", &test_member("m1", false), input).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_story() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1", false)]])
                .append_query_results([[test_story("s1", "m1", false)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = service(db);

        service.delete("s1", &test_member("admin", true)).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_published_hides_drafts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let result = service.get_published("s1").await;

        assert!(matches!(result, Err(AppError::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_published_returns_enriched_detail() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1", true)]])
                .append_query_results([[aggregate_row("s1", 25, 100)]])
                .append_query_results([[test_category("c1", true)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = service(db);

        let detail = service.get_published("s1").await.unwrap();

        assert_eq!(detail.category_name.as_deref(), Some("Fiction"));
        assert_eq!(detail.rating.total_count, 25);
        // mean 4.0 over 25 ratings: 56 rating points + 15 volume points
        assert!((detail.rating.quality_score - 71.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_get_for_editor_allows_author_draft() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1", false)]])
                .into_connection(),
        );
        let service = service(db);

        let story = service
            .get_for_editor("s1", &test_member("m1", false))
            .await
            .unwrap();

        assert_eq!(story.id, "s1");
    }

    #[tokio::test]
    async fn test_list_latest_attaches_rating_snapshots() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    test_story("s1", "m1", true),
                    test_story("s2", "m1", true),
                ]])
                .append_query_results([[aggregate_row("s1", 2, 9)]])
                .into_connection(),
        );
        let service = service(db);

        let items = service.list_latest(20, 0).await.unwrap();

        assert_eq!(items.len(), 2);
        assert!((items[0].rating.mean - 4.5).abs() < f64::EPSILON);
        assert!(items[0].rating.quality_score > 0.0);
        assert!((items[1].rating.quality_score - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_list_top_rated_maps_joined_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    (test_story("s1", "m1", true), aggregate_row("s1", 10, 48)),
                    (test_story("s2", "m1", true), aggregate_row("s2", 4, 12)),
                ]])
                .into_connection(),
        );
        let service = service(db);

        let items = service.list_top_rated(20).await.unwrap();

        assert_eq!(items.len(), 2);
        assert!(items[0].rating.mean > items[1].rating.mean);
    }

    #[tokio::test]
    async fn test_list_all_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let result = service.list_all(&test_member("m1", false), 20, 0).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
