//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(User::Name).string_len(256).not_null())
                    .col(ColumnDef::new(User::Email).string_len(320).not_null().unique_key())
                    .col(ColumnDef::new(User::Username).string_len(128).unique_key())
                    .col(ColumnDef::new(User::Department).string_len(128).not_null())
                    .col(ColumnDef::new(User::Role).string_len(16).not_null().default("employee"))
                    .col(ColumnDef::new(User::SupervisorEmail).string_len(320))
                    .col(ColumnDef::new(User::PasswordHash).string_len(256).not_null())
                    .col(ColumnDef::new(User::Token).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: department (department-scoped retrieval and aggregates)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_department")
                    .table(User::Table)
                    .col(User::Department)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Name,
    Email,
    Username,
    Department,
    Role,
    SupervisorEmail,
    PasswordHash,
    Token,
    CreatedAt,
}
