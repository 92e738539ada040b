//! Create organization table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organization::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organization::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Organization::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Organization::Address).text().not_null())
                    .col(ColumnDef::new(Organization::ContactPhone).string_len(20).not_null())
                    .col(ColumnDef::new(Organization::ContactEmail).string_len(120).not_null())
                    .col(ColumnDef::new(Organization::Description).text())
                    .col(
                        ColumnDef::new(Organization::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Organization::VerificationDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Organization::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Organization::Rating).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(Organization::ResponseTimeHours)
                            .integer()
                            .not_null()
                            .default(24),
                    )
                    .col(ColumnDef::new(Organization::LogoUrl).string_len(200))
                    .to_owned(),
            )
            .await?;

        // Directory lookups: verified organizations by category
        manager
            .create_index(
                Index::create()
                    .name("idx_organization_verified_category")
                    .table(Organization::Table)
                    .col(Organization::IsVerified)
                    .col(Organization::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Organization::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Organization {
    Table,
    Id,
    Name,
    Category,
    Address,
    ContactPhone,
    ContactEmail,
    Description,
    IsVerified,
    VerificationDate,
    CreatedAt,
    Rating,
    ResponseTimeHours,
    LogoUrl,
}
