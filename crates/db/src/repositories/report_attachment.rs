//! Report attachment repository.

use std::sync::Arc;

use crate::entities::{ReportAttachment, report_attachment};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Attachment repository for database operations.
#[derive(Clone)]
pub struct ReportAttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportAttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record an attachment on the given connection or transaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: report_attachment::ActiveModel,
    ) -> AppResult<report_attachment::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attachments of a report in upload order.
    pub async fn list_for_report(
        &self,
        report_id: i32,
    ) -> AppResult<Vec<report_attachment::Model>> {
        ReportAttachment::find()
            .filter(report_attachment::Column::ReportId.eq(report_id))
            .order_by_asc(report_attachment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
