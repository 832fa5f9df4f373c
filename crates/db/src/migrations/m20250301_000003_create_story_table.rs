//! Create story table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Story::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Story::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Story::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Story::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Story::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Story::Slug).string_len(256).not_null())
                    .col(ColumnDef::new(Story::Summary).text())
                    .col(ColumnDef::new(Story::Body).text().not_null())
                    .col(ColumnDef::new(Story::CoverImageUrl).string_len(1024))
                    .col(ColumnDef::new(Story::ViewCount).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Story::ReadingTimeMinutes)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Story::Active).boolean().not_null().default(false))
                    .col(ColumnDef::new(Story::ActiveFrom).timestamp_with_time_zone())
                    .col(ColumnDef::new(Story::ActiveUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Story::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Story::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_author")
                            .from(Story::Table, Story::AuthorId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_category")
                            .from(Story::Table, Story::CategoryId)
                            .to(Category::Table, Category::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: slug
        manager
            .create_index(
                Index::create()
                    .name("idx_story_slug")
                    .table(Story::Table)
                    .col(Story::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: author_id (for per-author listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_author_id")
                    .table(Story::Table)
                    .col(Story::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: category_id (for category listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_category_id")
                    .table(Story::Table)
                    .col(Story::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Index: (active, active_until) - expiry sweep and expiring-soon scans
        manager
            .create_index(
                Index::create()
                    .name("idx_story_active_until")
                    .table(Story::Table)
                    .col(Story::Active)
                    .col(Story::ActiveUntil)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_created_at")
                    .table(Story::Table)
                    .col(Story::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Story::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
    AuthorId,
    CategoryId,
    Title,
    Slug,
    Summary,
    Body,
    CoverImageUrl,
    ViewCount,
    ReadingTimeMinutes,
    Active,
    ActiveFrom,
    ActiveUntil,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}
