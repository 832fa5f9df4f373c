//! Create member table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Member::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Member::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Member::Username).string_len(128).not_null())
                    .col(ColumnDef::new(Member::Email).string_len(256).not_null())
                    .col(ColumnDef::new(Member::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(Member::DisplayName).string_len(128))
                    .col(ColumnDef::new(Member::Bio).text())
                    .col(ColumnDef::new(Member::AvatarUrl).string_len(1024))
                    .col(ColumnDef::new(Member::IsAdmin).boolean().not_null().default(false))
                    .col(ColumnDef::new(Member::Token).string_len(64))
                    .col(
                        ColumnDef::new(Member::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Member::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Unique index: username
        manager
            .create_index(
                Index::create()
                    .name("idx_member_username")
                    .table(Member::Table)
                    .col(Member::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: email
        manager
            .create_index(
                Index::create()
                    .name("idx_member_email")
                    .table(Member::Table)
                    .col(Member::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: token (for bearer auth lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_token")
                    .table(Member::Table)
                    .col(Member::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Member::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    DisplayName,
    Bio,
    AvatarUrl,
    IsAdmin,
    Token,
    CreatedAt,
    UpdatedAt,
}
