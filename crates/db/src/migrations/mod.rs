//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_organization_table;
mod m20250301_000002_create_user_table;
mod m20250301_000003_create_session_table;
mod m20250301_000004_create_report_table;
mod m20250301_000005_create_report_update_table;
mod m20250301_000006_create_aid_request_table;
mod m20250301_000007_create_verification_record_table;
mod m20250301_000008_create_system_log_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_organization_table::Migration),
            Box::new(m20250301_000002_create_user_table::Migration),
            Box::new(m20250301_000003_create_session_table::Migration),
            Box::new(m20250301_000004_create_report_table::Migration),
            Box::new(m20250301_000005_create_report_update_table::Migration),
            Box::new(m20250301_000006_create_aid_request_table::Migration),
            Box::new(m20250301_000007_create_verification_record_table::Migration),
            Box::new(m20250301_000008_create_system_log_table::Migration),
        ]
    }
}
