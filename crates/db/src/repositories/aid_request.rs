//! Aid request repository.

use std::sync::Arc;

use crate::entities::{AidRequest, aid_request};
use safenet_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Aid request repository for database operations.
#[derive(Clone)]
pub struct AidRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl AidRequestRepository {
    /// Create a new aid request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an aid request by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<aid_request::Model>> {
        AidRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an aid request on the given connection or transaction.
    pub async fn create_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: aid_request::ActiveModel,
    ) -> AppResult<aid_request::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Aid requests of a report.
    pub async fn list_for_report(&self, report_id: i32) -> AppResult<Vec<aid_request::Model>> {
        AidRequest::find()
            .filter(aid_request::Column::ReportId.eq(report_id))
            .order_by_asc(aid_request::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Aid requests of several reports, newest first.
    pub async fn list_for_reports(&self, report_ids: &[i32]) -> AppResult<Vec<aid_request::Model>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }

        AidRequest::find()
            .filter(aid_request::Column::ReportId.is_in(report_ids.iter().copied()))
            .order_by_desc(aid_request::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an aid request.
    pub async fn update(&self, model: aid_request::ActiveModel) -> AppResult<aid_request::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_list_for_reports_empty_skips_query() {
        // No query results queued: any query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = AidRequestRepository::new(db);
        assert!(repo.list_for_reports(&[]).await.unwrap().is_empty());
    }
}
