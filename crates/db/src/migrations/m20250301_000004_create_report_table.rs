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
                    .col(
                        ColumnDef::new(Report::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::TrackingCode).string_len(64).not_null())
                    .col(ColumnDef::new(Report::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Report::Description).text().not_null())
                    .col(ColumnDef::new(Report::Location).string_len(200).not_null())
                    .col(ColumnDef::new(Report::Latitude).double())
                    .col(ColumnDef::new(Report::Longitude).double())
                    .col(ColumnDef::new(Report::IncidentDate).timestamp_with_time_zone().not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Report::Priority)
                            .string_len(20)
                            .not_null()
                            .default("Medium"),
                    )
                    .col(ColumnDef::new(Report::AssignedProviderId).integer())
                    .col(
                        ColumnDef::new(Report::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::AssignedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Report::ResolvedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::IpHash).string_len(64))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_assigned_provider")
                            .from(Report::Table, Report::AssignedProviderId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_tracking_code")
                    .table(Report::Table)
                    .col(Report::TrackingCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_status")
                    .table(Report::Table)
                    .col(Report::Status)
                    .to_owned(),
            )
            .await?;

        // Provider report lists
        manager
            .create_index(
                Index::create()
                    .name("idx_report_assigned_provider_id")
                    .table(Report::Table)
                    .col(Report::AssignedProviderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_submitted_at")
                    .table(Report::Table)
                    .col(Report::SubmittedAt)
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
    TrackingCode,
    Category,
    Description,
    Location,
    Latitude,
    Longitude,
    IncidentDate,
    Status,
    Priority,
    AssignedProviderId,
    SubmittedAt,
    AssignedAt,
    ResolvedAt,
    UpdatedAt,
    IpHash,
}

#[derive(Iden)]
enum Organization {
    Table,
    Id,
}
