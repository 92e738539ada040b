//! Create aid request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AidRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AidRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AidRequest::ReportId).integer().not_null())
                    .col(ColumnDef::new(AidRequest::AidType).string_len(50).not_null())
                    .col(ColumnDef::new(AidRequest::Description).text())
                    .col(
                        ColumnDef::new(AidRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(AidRequest::Urgency)
                            .string_len(20)
                            .not_null()
                            .default("Normal"),
                    )
                    .col(
                        ColumnDef::new(AidRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AidRequest::FulfilledAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_aid_request_report")
                            .from(AidRequest::Table, AidRequest::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_aid_request_report_id")
                    .table(AidRequest::Table)
                    .col(AidRequest::ReportId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AidRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AidRequest {
    Table,
    Id,
    ReportId,
    AidType,
    Description,
    Status,
    Urgency,
    CreatedAt,
    FulfilledAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
