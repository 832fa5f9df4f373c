//! Story publishing history repository.

use std::sync::Arc;

use crate::entities::{StoryPublishingHistory, story_publishing_history};
use fabula_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Publishing history repository.
///
/// The trail is append-only; there are no update or delete methods.
#[derive(Clone)]
pub struct PublishingHistoryRepository {
    db: Arc<DatabaseConnection>,
}

impl PublishingHistoryRepository {
    /// Create a new publishing history repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an audit row on the given connection, typically the same
    /// transaction that mutates the story.
    pub async fn insert_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: story_publishing_history::ActiveModel,
    ) -> AppResult<story_publishing_history::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A story's audit trail, newest first.
    pub async fn find_by_story(
        &self,
        story_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story_publishing_history::Model>> {
        StoryPublishingHistory::find()
            .filter(story_publishing_history::Column::StoryId.eq(story_id))
            .order_by_desc(story_publishing_history::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a story's audit rows.
    pub async fn count_by_story(&self, story_id: &str) -> AppResult<u64> {
        StoryPublishingHistory::find()
            .filter(story_publishing_history::Column::StoryId.eq(story_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::story_publishing_history::PublishingAction;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_row(id: &str, story_id: &str) -> story_publishing_history::Model {
        story_publishing_history::Model {
            id: id.to_string(),
            story_id: story_id.to_string(),
            member_id: "m1".to_string(),
            action: PublishingAction::Published,
            previous_active: false,
            new_active: true,
            previous_active_from: None,
            new_active_from: Some(Utc::now()),
            previous_active_until: None,
            new_active_until: None,
            note: None,
            changed_fields: serde_json::json!(["active", "active_from"]),
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_story() {
        let h1 = create_test_row("h1", "s1");
        let h2 = create_test_row("h2", "s1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[h1, h2]])
                .into_connection(),
        );

        let repo = PublishingHistoryRepository::new(db);
        let result = repo.find_by_story("s1", 20, 0).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].action, PublishingAction::Published);
    }

    #[tokio::test]
    async fn test_count_by_story() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = PublishingHistoryRepository::new(db);
        let count = repo.count_by_story("s1").await.unwrap();

        assert_eq!(count, 3);
    }
}
