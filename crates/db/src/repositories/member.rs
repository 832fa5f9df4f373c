//! Member repository.

use std::sync::Arc;

use crate::entities::{Member, member};
use fabula_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Member repository for database operations.
#[derive(Clone)]
pub struct MemberRepository {
    db: Arc<DatabaseConnection>,
}

impl MemberRepository {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a member by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<member::Model>> {
        Member::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new member.
    pub async fn create(&self, model: member::ActiveModel) -> AppResult<member::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a member.
    pub async fn update(&self, model: member::ActiveModel) -> AppResult<member::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all members.
    pub async fn count(&self) -> AppResult<u64> {
        Member::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_member(id: &str, username: &str) -> member::Model {
        member::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin: false,
            token: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let member = create_test_member("m1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member.clone()]])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let result = repo.find_by_id("m1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_find_by_username_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member::Model>::new()])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let result = repo.find_by_username("nobody").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let mut member = create_test_member("m1", "alice");
        member.token = Some("tok".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member]])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let result = repo.find_by_token("tok").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "m1");
    }
}
