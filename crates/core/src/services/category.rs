//! Category service.

use chrono::Utc;
use fabula_common::{id::IdGenerator, AppError, AppResult};
use fabula_db::entities::{category, member};
use fabula_db::repositories::{CategoryRepository, StoryRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::story::slugify;

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    /// Explicit slug. Derived from the name when absent.
    #[validate(length(min = 1, max = 128))]
    pub slug: Option<String>,

    #[validate(length(max = 1024))]
    pub description: Option<String>,

    pub display_order: Option<i32>,
}

/// Input for updating a category.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,

    #[validate(length(max = 1024))]
    pub description: Option<Option<String>>,

    pub display_order: Option<i32>,

    pub is_active: Option<bool>,
}

/// Service for story categories.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    story_repo: StoryRepository,
    id_gen: IdGenerator,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository, story_repo: StoryRepository) -> Self {
        Self {
            category_repo,
            story_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new category.
    pub async fn create(
        &self,
        actor: &member::Model,
        input: CreateCategoryInput,
    ) -> AppResult<category::Model> {
        input.validate()?;
        require_admin(actor)?;

        let slug = input.slug.unwrap_or_else(|| slugify(&input.name));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "name does not produce a usable slug".to_string(),
            ));
        }
        if self.category_repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!("slug {slug} is already in use")));
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            display_order: Set(input.display_order.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let category = self.category_repo.create(model).await?;
        info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    /// Update a category. Deactivating hides it and blocks new stories.
    pub async fn update(
        &self,
        category_id: &str,
        actor: &member::Model,
        input: UpdateCategoryInput,
    ) -> AppResult<category::Model> {
        input.validate()?;
        require_admin(actor)?;

        let category = self
            .category_repo
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {category_id}")))?;

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(display_order) = input.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));

        self.category_repo.update(active).await
    }

    /// Delete a category. Refused while stories still reference it.
    pub async fn delete(&self, category_id: &str, actor: &member::Model) -> AppResult<()> {
        require_admin(actor)?;

        if self
            .category_repo
            .find_by_id(category_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!("category {category_id}")));
        }

        let story_count = self.story_repo.count_by_category(category_id).await?;
        if story_count > 0 {
            return Err(AppError::Conflict(format!(
                "category still has {story_count} stories"
            )));
        }

        self.category_repo.delete(category_id).await?;
        info!(category_id = %category_id, "Deleted category");
        Ok(())
    }

    /// Get a category by ID.
    pub async fn get(&self, category_id: &str) -> AppResult<category::Model> {
        self.category_repo
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {category_id}")))
    }

    /// Get a category by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.category_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("category {slug}")))
    }

    /// Active categories for public navigation.
    pub async fn list_active(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.find_active().await
    }

    /// Every category for the admin panel.
    pub async fn list_all(&self, actor: &member::Model) -> AppResult<Vec<category::Model>> {
        require_admin(actor)?;
        self.category_repo.find_all().await
    }
}

fn require_admin(actor: &member::Model) -> AppResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("only admins can manage categories".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
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
            is_admin: false,
            ..admin()
        }
    }

    fn category_row(id: &str, slug: &str) -> category::Model {
        category::Model {
            id: id.to_string(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            description: None,
            display_order: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> CategoryService {
        CategoryService::new(CategoryRepository::new(db.clone()), StoryRepository::new(db))
    }

    fn create_input(name: &str) -> CreateCategoryInput {
        CreateCategoryInput {
            name: name.to_string(),
            slug: None,
            description: None,
            display_order: None,
        }
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let result = service.create(&reader(), create_input("Fiction")).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category_row("c1", "fiction")]])
                .into_connection(),
        );
        let service = service(db);

        let result = service.create(&admin(), create_input("Fiction")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_derives_slug_from_name() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .append_query_results([[category_row("c1", "short-fiction")]])
                .into_connection(),
        );
        let service = service(db);

        let category = service
            .create(&admin(), create_input("Short Fiction"))
            .await
            .unwrap();

        assert_eq!(category.slug, "short-fiction");
    }

    #[tokio::test]
    async fn test_delete_refused_while_stories_remain() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category_row("c1", "fiction")]])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3)),
                }]])
                .into_connection(),
        );
        let service = service(db);

        let result = service.delete("c1", &admin()).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_can_deactivate() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[category_row("c1", "fiction")]])
                .append_query_results([[category::Model {
                    is_active: false,
                    ..category_row("c1", "fiction")
                }]])
                .into_connection(),
        );
        let service = service(db);

        let input = UpdateCategoryInput {
            is_active: Some(false),
            ..Default::default()
        };
        let category = service.update("c1", &admin(), input).await.unwrap();

        assert!(!category.is_active);
    }
}
