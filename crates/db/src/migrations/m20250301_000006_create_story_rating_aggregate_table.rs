//! Create story rating aggregate table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Aggregate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Aggregate::StoryId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Aggregate::TotalCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Aggregate::RatingSum).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Aggregate::Mean).double().not_null().default(0.0))
                    .col(ColumnDef::new(Aggregate::Histogram).json_binary().not_null())
                    .col(
                        ColumnDef::new(Aggregate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Aggregate::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_rating_aggregate_story")
                            .from(Aggregate::Table, Aggregate::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: mean (for top-rated listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_rating_aggregate_mean")
                    .table(Aggregate::Table)
                    .col(Aggregate::Mean)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Aggregate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Aggregate {
    #[iden = "story_rating_aggregate"]
    Table,
    StoryId,
    TotalCount,
    RatingSum,
    Mean,
    Histogram,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
}
