//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_member_table;
mod m20250301_000002_create_category_table;
mod m20250301_000003_create_story_table;
mod m20250301_000004_create_story_publishing_history_table;
mod m20250301_000005_create_member_story_rating_table;
mod m20250301_000006_create_story_rating_aggregate_table;
mod m20250301_000007_create_tag_tables;
mod m20250301_000008_create_bookmark_table;
mod m20250301_000009_create_reading_progress_table;
mod m20250301_000010_create_app_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_member_table::Migration),
            Box::new(m20250301_000002_create_category_table::Migration),
            Box::new(m20250301_000003_create_story_table::Migration),
            Box::new(m20250301_000004_create_story_publishing_history_table::Migration),
            Box::new(m20250301_000005_create_member_story_rating_table::Migration),
            Box::new(m20250301_000006_create_story_rating_aggregate_table::Migration),
            Box::new(m20250301_000007_create_tag_tables::Migration),
            Box::new(m20250301_000008_create_bookmark_table::Migration),
            Box::new(m20250301_000009_create_reading_progress_table::Migration),
            Box::new(m20250301_000010_create_app_settings_table::Migration),
        ]
    }
}
