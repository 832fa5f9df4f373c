//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `fabula_test`)
//!   `TEST_DB_PASSWORD` (default: `fabula_test`)
//!   `TEST_DB_NAME` (default: `fabula_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use fabula_db::entities::{category, member, story};
use fabula_db::repositories::{CategoryRepository, MemberRepository, StoryRepository};
use fabula_db::test_utils::{TestDatabase, TestDbConfig, TestRedisConfig};
use sea_orm::{Set, SqlxPostgresConnector};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply_cleanly() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    let result = fabula_db::migrate(db.connection()).await;
    assert!(result.is_ok(), "Migration failed: {:?}", result.err());
    db.drop_database().await.expect("Failed to drop db");
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_story_round_trip_with_expiry_window() {
    let db = TestDatabase::create_unique().await.expect("Failed to create db");
    fabula_db::migrate(db.connection()).await.expect("Migration failed");

    // `DatabaseConnection` is not `Clone` when sea-orm's `mock` feature is
    // enabled (as it is for this crate's tests), so share the underlying
    // pool handle instead — the same thing the derived `Clone` would copy.
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.connection().get_postgres_connection_pool().clone(),
    ));
    let members = MemberRepository::new(conn.clone());
    let categories = CategoryRepository::new(conn.clone());
    let stories = StoryRepository::new(conn);

    let now = Utc::now();

    let author = members
        .create(member::ActiveModel {
            id: Set("01member000000000000000000".to_string()),
            username: Set("alice".to_string()),
            email: Set("alice@example.com".to_string()),
            password_hash: Set("hash".to_string()),
            display_name: Set(None),
            bio: Set(None),
            avatar_url: Set(None),
            is_admin: Set(true),
            token: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        })
        .await
        .expect("Failed to insert member");

    let category = categories
        .create(category::ActiveModel {
            id: Set("01category0000000000000000".to_string()),
            name: Set("Fiction".to_string()),
            slug: Set("fiction".to_string()),
            description: Set(None),
            display_order: Set(0),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        })
        .await
        .expect("Failed to insert category");

    stories
        .create(story::ActiveModel {
            id: Set("01story0000000000000000000".to_string()),
            author_id: Set(author.id.clone()),
            category_id: Set(category.id.clone()),
            title: Set("The Lighthouse".to_string()),
            slug: Set("the-lighthouse".to_string()),
            summary: Set(None),
            body: Set("A story about a lighthouse.".to_string()),
            cover_image_url: Set(None),
            view_count: Set(0),
            reading_time_minutes: Set(1),
            active: Set(true),
            active_from: Set(Some(now - Duration::hours(1))),
            active_until: Set(Some(now + Duration::hours(2))),
            created_at: Set(now),
            updated_at: Set(None),
        })
        .await
        .expect("Failed to insert story");

    let found = stories
        .find_by_slug("the-lighthouse")
        .await
        .expect("Query failed")
        .expect("Story missing");
    assert!(found.is_effectively_published(now));

    // In a 3 hour lookahead but not a 1 hour one
    let soon = stories
        .find_expiring_between(now, now + Duration::hours(3), 50)
        .await
        .expect("Query failed");
    assert_eq!(soon.len(), 1);

    let not_yet = stories
        .find_expiring_between(now, now + Duration::hours(1), 50)
        .await
        .expect("Query failed");
    assert!(not_yet.is_empty());

    db.drop_database().await.expect("Failed to drop db");
}

#[test]
fn test_config_from_env() {
    // Test that default config is valid
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_redis_config_from_env() {
    let config = TestRedisConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}

#[test]
fn test_postgres_url_format() {
    let config = TestDbConfig::default();
    let url = config.postgres_url();
    assert!(url.ends_with("/postgres"));
}
