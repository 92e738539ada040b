//! Create verification record table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VerificationRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationRecord::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VerificationRecord::OrganizationId).integer().not_null())
                    .col(
                        ColumnDef::new(VerificationRecord::VerifiedByUserId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VerificationRecord::Decision).string_len(20).not_null())
                    .col(ColumnDef::new(VerificationRecord::Notes).text())
                    .col(ColumnDef::new(VerificationRecord::DocumentsChecked).text())
                    .col(
                        ColumnDef::new(VerificationRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_record_organization")
                            .from(VerificationRecord::Table, VerificationRecord::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_record_user")
                            .from(VerificationRecord::Table, VerificationRecord::VerifiedByUserId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_verification_record_organization_id")
                    .table(VerificationRecord::Table)
                    .col(VerificationRecord::OrganizationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VerificationRecord {
    Table,
    Id,
    OrganizationId,
    VerifiedByUserId,
    Decision,
    Notes,
    DocumentsChecked,
    CreatedAt,
}

#[derive(Iden)]
enum Organization {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
