//! Create reading progress table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Progress::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Progress::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Progress::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(Progress::StoryId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Progress::Percent)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Progress::Percent).between(0, 100)),
                    )
                    .col(
                        ColumnDef::new(Progress::LastReadAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Progress::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Progress::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_progress_member")
                            .from(Progress::Table, Progress::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reading_progress_story")
                            .from(Progress::Table, Progress::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (member_id, story_id) - one position per member per story
        manager
            .create_index(
                Index::create()
                    .name("idx_reading_progress_member_story")
                    .table(Progress::Table)
                    .col(Progress::MemberId)
                    .col(Progress::StoryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (member_id, last_read_at) - the in-progress listing
        manager
            .create_index(
                Index::create()
                    .name("idx_reading_progress_member_last_read")
                    .table(Progress::Table)
                    .col(Progress::MemberId)
                    .col(Progress::LastReadAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Progress::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Progress {
    #[iden = "reading_progress"]
    Table,
    Id,
    MemberId,
    StoryId,
    Percent,
    LastReadAt,
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
