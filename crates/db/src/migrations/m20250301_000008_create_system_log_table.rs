//! Create system log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SystemLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SystemLog::EventType).string_len(50).not_null())
                    .col(ColumnDef::new(SystemLog::UserId).integer())
                    .col(ColumnDef::new(SystemLog::IpHash).string_len(64))
                    .col(ColumnDef::new(SystemLog::Details).text())
                    .col(
                        ColumnDef::new(SystemLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Audit browsing filters by event type, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_system_log_event_type_created_at")
                    .table(SystemLog::Table)
                    .col(SystemLog::EventType)
                    .col(SystemLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SystemLog {
    Table,
    Id,
    EventType,
    UserId,
    IpHash,
    Details,
    CreatedAt,
}
