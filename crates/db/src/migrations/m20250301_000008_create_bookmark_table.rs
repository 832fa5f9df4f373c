//! Create bookmark table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookmark::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookmark::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Bookmark::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(Bookmark::StoryId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Bookmark::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmark_member")
                            .from(Bookmark::Table, Bookmark::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmark_story")
                            .from(Bookmark::Table, Bookmark::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (member_id, story_id) - one bookmark per member per story
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmark_member_story")
                    .table(Bookmark::Table)
                    .col(Bookmark::MemberId)
                    .col(Bookmark::StoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookmark::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Bookmark {
    Table,
    Id,
    MemberId,
    StoryId,
    CreatedAt,
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
