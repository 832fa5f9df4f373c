//! Create tag and story_tag tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tag::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Tag::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Tag::UsageCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Tag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: name
        manager
            .create_index(
                Index::create()
                    .name("idx_tag_name")
                    .table(Tag::Table)
                    .col(Tag::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoryTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StoryTag::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(StoryTag::StoryId).string_len(32).not_null())
                    .col(ColumnDef::new(StoryTag::TagId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(StoryTag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_tag_story")
                            .from(StoryTag::Table, StoryTag::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_tag_tag")
                            .from(StoryTag::Table, StoryTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (story_id, tag_id) - one attachment per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_story_tag_story_tag")
                    .table(StoryTag::Table)
                    .col(StoryTag::StoryId)
                    .col(StoryTag::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: tag_id (for listing stories under a tag)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_tag_tag_id")
                    .table(StoryTag::Table)
                    .col(StoryTag::TagId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoryTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tag::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
    Name,
    UsageCount,
    CreatedAt,
}

#[derive(Iden)]
enum StoryTag {
    Table,
    Id,
    StoryId,
    TagId,
    CreatedAt,
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
}
