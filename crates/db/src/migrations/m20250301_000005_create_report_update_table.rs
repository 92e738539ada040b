//! Create report update and attachment tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportUpdate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportUpdate::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportUpdate::ReportId).integer().not_null())
                    .col(ColumnDef::new(ReportUpdate::Status).string_len(20).not_null())
                    .col(ColumnDef::new(ReportUpdate::Message).text().not_null())
                    .col(ColumnDef::new(ReportUpdate::CreatedByUserId).integer())
                    .col(
                        ColumnDef::new(ReportUpdate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_update_report")
                            .from(ReportUpdate::Table, ReportUpdate::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_update_user")
                            .from(ReportUpdate::Table, ReportUpdate::CreatedByUserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // History is read in chronological order per report
        manager
            .create_index(
                Index::create()
                    .name("idx_report_update_report_id_created_at")
                    .table(ReportUpdate::Table)
                    .col(ReportUpdate::ReportId)
                    .col(ReportUpdate::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportAttachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportAttachment::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportAttachment::ReportId).integer().not_null())
                    .col(ColumnDef::new(ReportAttachment::Filename).string_len(255).not_null())
                    .col(
                        ColumnDef::new(ReportAttachment::OriginalFilename)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportAttachment::FileType).string_len(50).not_null())
                    .col(ColumnDef::new(ReportAttachment::FilePath).string_len(500).not_null())
                    .col(ColumnDef::new(ReportAttachment::FileSize).big_integer().not_null())
                    .col(
                        ColumnDef::new(ReportAttachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_attachment_report")
                            .from(ReportAttachment::Table, ReportAttachment::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_attachment_report_id")
                    .table(ReportAttachment::Table)
                    .col(ReportAttachment::ReportId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportAttachment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReportUpdate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportUpdate {
    Table,
    Id,
    ReportId,
    Status,
    Message,
    CreatedByUserId,
    CreatedAt,
}

#[derive(Iden)]
enum ReportAttachment {
    Table,
    Id,
    ReportId,
    Filename,
    OriginalFilename,
    FileType,
    FilePath,
    FileSize,
    CreatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
