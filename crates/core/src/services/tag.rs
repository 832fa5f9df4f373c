//! Tag service.

use chrono::Utc;
use fabula_common::{AppError, AppResult, IdGenerator};
use fabula_db::{
    entities::{member, story_tag, tag},
    repositories::{StoryRepository, TagRepository},
};
use sea_orm::Set;
use tracing::info;

use super::publishing::can_update;

/// Maximum length of a normalized tag name.
const MAX_TAG_LENGTH: usize = 64;

/// Maximum number of tags a single story can carry.
const MAX_TAGS_PER_STORY: usize = 20;

/// Tag service for business logic.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
    story_repo: StoryRepository,
    id_gen: IdGenerator,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository, story_repo: StoryRepository) -> Self {
        Self {
            tag_repo,
            story_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a tag by name.
    pub async fn get(&self, name: &str) -> AppResult<tag::Model> {
        let name = normalize_tag_name(name);
        self.tag_repo
            .find_by_name(&name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag not found: {name}")))
    }

    /// List tags, most used first.
    pub async fn list(&self, limit: u64) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.find_all(limit).await
    }

    /// Tags attached to a story.
    pub async fn list_for_story(&self, story_id: &str) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.find_by_story(story_id).await
    }

    /// Attach a tag to a story, creating the tag if it does not exist yet.
    pub async fn attach(
        &self,
        story_id: &str,
        actor: &member::Model,
        name: &str,
    ) -> AppResult<tag::Model> {
        let name = normalize_tag_name(name);
        if !is_valid_tag_name(&name) {
            return Err(AppError::Validation(
                "tag names may use lowercase letters, digits, hyphens and underscores".to_string(),
            ));
        }

        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;
        if !can_update(actor, &story) {
            return Err(AppError::Forbidden("cannot modify this story".to_string()));
        }

        let attached = self.tag_repo.find_by_story(story_id).await?;
        if attached.len() >= MAX_TAGS_PER_STORY {
            return Err(AppError::Validation(format!(
                "a story can carry at most {MAX_TAGS_PER_STORY} tags"
            )));
        }

        let tag = match self.tag_repo.find_by_name(&name).await? {
            Some(tag) => tag,
            None => {
                self.tag_repo
                    .create(tag::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        name: Set(name.clone()),
                        usage_count: Set(0),
                        created_at: Set(Utc::now()),
                    })
                    .await?
            }
        };

        if self
            .tag_repo
            .find_attachment(story_id, &tag.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "tag {name} is already attached"
            )));
        }

        self.tag_repo
            .attach(story_tag::ActiveModel {
                id: Set(self.id_gen.generate()),
                story_id: Set(story_id.to_string()),
                tag_id: Set(tag.id.clone()),
                created_at: Set(Utc::now()),
            })
            .await?;
        self.tag_repo.increment_usage(&tag.id).await?;

        info!(story_id = %story_id, tag = %name, "Attached tag to story");

        Ok(tag)
    }

    /// Detach a tag from a story by name.
    pub async fn detach(
        &self,
        story_id: &str,
        actor: &member::Model,
        name: &str,
    ) -> AppResult<()> {
        let name = normalize_tag_name(name);

        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;
        if !can_update(actor, &story) {
            return Err(AppError::Forbidden("cannot modify this story".to_string()));
        }

        let tag = self
            .tag_repo
            .find_by_name(&name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag not found: {name}")))?;

        let detached = self.tag_repo.detach(story_id, &tag.id).await?;
        if !detached {
            return Err(AppError::NotFound(format!(
                "tag {name} is not attached to this story"
            )));
        }
        self.tag_repo.decrement_usage(&tag.id).await?;

        info!(story_id = %story_id, tag = %name, "Detached tag from story");

        Ok(())
    }
}

/// Lowercase the name and strip surrounding whitespace and a leading `#`.
fn normalize_tag_name(name: &str) -> String {
    name.trim().trim_start_matches('#').to_lowercase()
}

fn is_valid_tag_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TAG_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn admin() -> member::Model {
        member::Model {
            id: "m1".to_string(),
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "hash".to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin: true,
            token: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn reader() -> member::Model {
        member::Model {
            id: "m2".to_string(),
            is_admin: false,
            ..admin()
        }
    }

    fn test_story(id: &str, author_id: &str) -> fabula_db::entities::story::Model {
        fabula_db::entities::story::Model {
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
            active: true,
            active_from: None,
            active_until: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn test_tag(id: &str, name: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            usage_count: 1,
            created_at: Utc::now(),
        }
    }

    fn test_attachment(story_id: &str, tag_id: &str) -> story_tag::Model {
        story_tag::Model {
            id: format!("st-{story_id}-{tag_id}"),
            story_id: story_id.to_string(),
            tag_id: tag_id.to_string(),
            created_at: Utc::now(),
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> TagService {
        TagService::new(TagRepository::new(db.clone()), StoryRepository::new(db))
    }

    #[test]
    fn test_normalize_tag_name() {
        assert_eq!(normalize_tag_name("  #Adventure "), "adventure");
        assert_eq!(normalize_tag_name("SliceOfLife"), "sliceoflife");
        assert_eq!(normalize_tag_name("dark-fantasy"), "dark-fantasy");
    }

    #[test]
    fn test_is_valid_tag_name() {
        assert!(is_valid_tag_name("adventure"));
        assert!(is_valid_tag_name("dark-fantasy_2"));
        assert!(!is_valid_tag_name(""));
        assert!(!is_valid_tag_name("two words"));
        assert!(!is_valid_tag_name(&"x".repeat(MAX_TAG_LENGTH + 1)));
    }

    #[tokio::test]
    async fn test_attach_rejects_invalid_name() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(db).attach("s1", &admin(), "no spaces allowed").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_attach_requires_author_or_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1")]])
                .into_connection(),
        );

        let result = service(db).attach("s1", &reader(), "adventure").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_attach_existing_tag() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1")]])
                .append_query_results([Vec::<tag::Model>::new()])
                .append_query_results([[test_tag("t1", "adventure")]])
                .append_query_results([Vec::<story_tag::Model>::new()])
                .append_query_results([[test_attachment("s1", "t1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let tag = service(db).attach("s1", &admin(), "#Adventure").await.unwrap();

        assert_eq!(tag.id, "t1");
        assert_eq!(tag.name, "adventure");
    }

    #[tokio::test]
    async fn test_attach_creates_missing_tag() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1")]])
                .append_query_results([Vec::<tag::Model>::new()])
                .append_query_results([Vec::<tag::Model>::new()])
                .append_query_results([[test_tag("t-new", "slowburn")]])
                .append_query_results([Vec::<story_tag::Model>::new()])
                .append_query_results([[test_attachment("s1", "t-new")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let tag = service(db).attach("s1", &admin(), "slowburn").await.unwrap();

        assert_eq!(tag.name, "slowburn");
    }

    #[tokio::test]
    async fn test_attach_duplicate_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1")]])
                .append_query_results([[test_tag("t1", "adventure")]])
                .append_query_results([[test_tag("t1", "adventure")]])
                .append_query_results([[test_attachment("s1", "t1")]])
                .into_connection(),
        );

        let result = service(db).attach("s1", &admin(), "adventure").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_detach_removes_and_decrements() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1")]])
                .append_query_results([[test_tag("t1", "adventure")]])
                .append_query_results([[test_attachment("s1", "t1")]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        service(db).detach("s1", &admin(), "adventure").await.unwrap();
    }

    #[tokio::test]
    async fn test_detach_not_attached_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_story("s1", "m1")]])
                .append_query_results([[test_tag("t1", "adventure")]])
                .append_query_results([Vec::<story_tag::Model>::new()])
                .into_connection(),
        );

        let result = service(db).detach("s1", &admin(), "adventure").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
