//! Report update repository.

use std::sync::Arc;

use crate::entities::{ReportUpdate, report_update};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Report update repository for database operations.
#[derive(Clone)]
pub struct ReportUpdateRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportUpdateRepository {
    /// Create a new report update repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an update on the given connection or transaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report_update::ActiveModel,
    ) -> AppResult<report_update::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Updates for a report, newest first.
    pub async fn list_for_report(&self, report_id: i32) -> AppResult<Vec<report_update::Model>> {
        ReportUpdate::find()
            .filter(report_update::Column::ReportId.eq(report_id))
            .order_by_desc(report_update::Column::CreatedAt)
            .order_by_desc(report_update::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
