//! Create story publishing history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(History::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(History::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(History::StoryId).string_len(32).not_null())
                    .col(ColumnDef::new(History::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(History::Action).string_len(16).not_null())
                    .col(ColumnDef::new(History::PreviousActive).boolean().not_null())
                    .col(ColumnDef::new(History::NewActive).boolean().not_null())
                    .col(ColumnDef::new(History::PreviousActiveFrom).timestamp_with_time_zone())
                    .col(ColumnDef::new(History::NewActiveFrom).timestamp_with_time_zone())
                    .col(ColumnDef::new(History::PreviousActiveUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(History::NewActiveUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(History::Note).text())
                    .col(ColumnDef::new(History::ChangedFields).json_binary().not_null())
                    .col(ColumnDef::new(History::IpAddress).string_len(64))
                    .col(ColumnDef::new(History::UserAgent).string_len(512))
                    .col(
                        ColumnDef::new(History::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_publishing_history_story")
                            .from(History::Table, History::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_publishing_history_member")
                            .from(History::Table, History::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (story_id, created_at) - the per-story audit trail listing
        manager
            .create_index(
                Index::create()
                    .name("idx_story_publishing_history_story_created")
                    .table(History::Table)
                    .col(History::StoryId)
                    .col(History::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: member_id (for per-actor review)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_publishing_history_member_id")
                    .table(History::Table)
                    .col(History::MemberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(History::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum History {
    #[iden = "story_publishing_history"]
    Table,
    Id,
    StoryId,
    MemberId,
    Action,
    PreviousActive,
    NewActive,
    PreviousActiveFrom,
    NewActiveFrom,
    PreviousActiveUntil,
    NewActiveUntil,
    Note,
    ChangedFields,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
