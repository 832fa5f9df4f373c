//! Create app settings table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppSettings::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AppSettings::StoryCacheTtlSeconds)
                            .big_integer()
                            .not_null()
                            .default(300),
                    )
                    .col(
                        ColumnDef::new(AppSettings::DashboardCacheTtlSeconds)
                            .big_integer()
                            .not_null()
                            .default(600),
                    )
                    .col(
                        ColumnDef::new(AppSettings::DefaultActiveDays)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(
                        ColumnDef::new(AppSettings::ExpiringSoonWindowHours)
                            .integer()
                            .not_null()
                            .default(48),
                    )
                    .col(
                        ColumnDef::new(AppSettings::RegistrationEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AppSettings::RatingsEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AppSettings::BookmarksEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AppSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AppSettings::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppSettings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AppSettings {
    Table,
    Id,
    StoryCacheTtlSeconds,
    DashboardCacheTtlSeconds,
    DefaultActiveDays,
    ExpiringSoonWindowHours,
    RegistrationEnabled,
    RatingsEnabled,
    BookmarksEnabled,
    CreatedAt,
    UpdatedAt,
}
