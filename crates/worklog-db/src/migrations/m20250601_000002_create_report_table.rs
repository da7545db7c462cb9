//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Report::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Report::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Week).integer().not_null())
                    .col(ColumnDef::new(Report::Year).integer().not_null())
                    .col(ColumnDef::new(Report::Month).integer())
                    .col(ColumnDef::new(Report::Achievements).text())
                    .col(ColumnDef::new(Report::Challenges).text())
                    .col(ColumnDef::new(Report::NextWeekPlan).text())
                    .col(ColumnDef::new(Report::Status).string_len(16).not_null().default("draft"))
                    .col(ColumnDef::new(Report::Attachments).json_binary().not_null().default("[]"))
                    .col(ColumnDef::new(Report::Tags).json_binary().not_null().default("[]"))
                    .col(ColumnDef::new(Report::Approvals).json_binary().not_null().default("[]"))
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::SubmittedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Composite index: (user_id, created_at) for the owner-scoped listing
        manager
            .create_index(
                Index::create()
                    .name("idx_report_user_id_created_at")
                    .table(Report::Table)
                    .col(Report::UserId)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: status + created_at (filtered listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_created_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Composite index: (year, week) for the weekly aggregate
        manager
            .create_index(
                Index::create()
                    .name("idx_report_year_week")
                    .table(Report::Table)
                    .col(Report::Year)
                    .col(Report::Week)
                    .to_owned(),
            )
            .await?;

        // Foreign key: user_id -> user.id
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_report_user_id")
                    .from(Report::Table, Report::UserId)
                    .to(User::Table, User::Id)
                    .on_delete(ForeignKeyAction::NoAction)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    UserId,
    Week,
    Year,
    Month,
    Achievements,
    Challenges,
    NextWeekPlan,
    Status,
    Attachments,
    Tags,
    Approvals,
    CreatedAt,
    SubmittedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
