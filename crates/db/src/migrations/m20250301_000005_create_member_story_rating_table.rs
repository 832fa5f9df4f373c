//! Create member story rating table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rating::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Rating::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(Rating::StoryId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Rating::Rating)
                            .integer()
                            .not_null()
                            .check(Expr::col(Rating::Rating).between(1, 5)),
                    )
                    .col(ColumnDef::new(Rating::Comment).text())
                    .col(
                        ColumnDef::new(Rating::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Rating::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_story_rating_member")
                            .from(Rating::Table, Rating::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_story_rating_story")
                            .from(Rating::Table, Rating::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (member_id, story_id) - one rating per member per story
        manager
            .create_index(
                Index::create()
                    .name("idx_member_story_rating_member_story")
                    .table(Rating::Table)
                    .col(Rating::MemberId)
                    .col(Rating::StoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: story_id (for listing a story's ratings)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_story_rating_story_id")
                    .table(Rating::Table)
                    .col(Rating::StoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Rating {
    #[iden = "member_story_rating"]
    Table,
    Id,
    MemberId,
    StoryId,
    Rating,
    Comment,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
}
